//! Semantic type inference for a single column.

use crate::config::EdaConfig;
use crate::table::CellValue;
use crate::types::SemanticType;
use crate::utils::is_integral;
use once_cell::sync::Lazy;
use regex::Regex;

// `id`, `user_id`, `PassengerId`, `RowID`; not `paid` or `valid`.
static ID_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|_)(?i:id)$|[a-z0-9](?:Id|ID)$").expect("Invalid regex: id column name")
});

/// Whether a column name reads like a row identifier.
pub(crate) fn looks_like_id_name(name: &str) -> bool {
    ID_NAME.is_match(name)
}

/// Infer the semantic type of a column from its name and cells.
///
/// `numeric` says whether every non-missing cell is a number (booleans are not).
pub(crate) fn infer_semantic_type(
    name: &str,
    values: &[CellValue],
    numeric: bool,
    unique_count: usize,
    config: &EdaConfig,
) -> SemanticType {
    let non_missing = values.iter().filter(|v| !v.is_missing()).count();
    let all_distinct = non_missing > 0 && unique_count == non_missing;

    if numeric {
        if looks_like_id_name(name) && all_distinct {
            return SemanticType::Identifier;
        }

        let all_integral = values
            .iter()
            .filter_map(CellValue::as_f64)
            .all(is_integral);
        if all_integral && unique_count >= 1 && unique_count <= config.discrete_max_cardinality {
            return SemanticType::Discrete;
        }

        return SemanticType::Numeric;
    }

    let is_text = values.iter().any(|v| matches!(v, CellValue::Text(_)));
    if is_text && non_missing > 0 {
        if looks_like_id_name(name) && all_distinct {
            return SemanticType::Identifier;
        }

        let unique_ratio = unique_count as f64 / non_missing as f64;
        if unique_count > config.discrete_max_cardinality
            && unique_ratio >= config.identifier_min_unique_ratio
        {
            return SemanticType::Identifier;
        }
    }

    SemanticType::Categorical
}
