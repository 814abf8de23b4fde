use crate::common::error::AppError;

// ---
// Helper: violações de unicidade viram Conflict
// ---
/// Converte um erro do sqlx em `AppError`, tratando violação de chave única como `Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.into());
        }
    }
    e.into()
}

/// Monta o padrão `%termo%` usado nas buscas com ILIKE.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards_and_skips_blank() {
        assert_eq!(like_pattern(Some("  ")), None);
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("café")), Some("%café%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn non_unique_errors_stay_internal() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "duplicado");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
