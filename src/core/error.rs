//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("blog error: {0}")]
    Blog(String),

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<crate::contact::FieldError>),

    #[error("news error: {0}")]
    News(#[from] crate::news::NewsError),

    #[error("email error: {0}")]
    Email(#[from] crate::mail::EmailError),

    #[error("server error: {0}")]
    Server(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Store(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn store_error_from_rusqlite() {
        let e: AppError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(e.to_string().starts_with("store error"));
    }

    #[test]
    fn news_error_converts() {
        let e: AppError = crate::news::NewsError::MissingKey.into();
        assert!(e.to_string().contains("news error"));
    }

    #[test]
    fn validation_error_counts_fields() {
        let e = AppError::Validation(vec![
            crate::contact::FieldError::new("name", "too short"),
            crate::contact::FieldError::new("email", "invalid"),
        ]);
        assert_eq!(e.to_string(), "validation failed on 2 field(s)");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
