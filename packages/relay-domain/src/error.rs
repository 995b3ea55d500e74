pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Csv(#[from] csv::Error),
	#[error("Failed to flush CSV output: {message}")]
	CsvFlush { message: String },
}
