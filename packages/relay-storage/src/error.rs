#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Blob storage error: {message}")]
	Blob { message: String },
}
