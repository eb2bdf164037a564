use crate::error::{PCenterError, Result};

pub fn validate_num_centers(num_nodes: usize, num_centers: usize) -> Result<()> {
    if num_nodes == 0 {
        return Err(PCenterError::malformed("Instance has no nodes"));
    }
    if num_centers == 0 || num_centers > num_nodes {
        return Err(PCenterError::malformed(format!(
            "Number of centers must be in 1..={}, got {}",
            num_nodes, num_centers
        )));
    }
    Ok(())
}

/// Check a per-node vector has one entry per node.
pub fn validate_length<T>(field: &str, values: &[T], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(PCenterError::malformed(format!(
            "Field '{}' has {} entries, expected {}",
            field,
            values.len(),
            expected
        )));
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, values: &[f64]) -> Result<()> {
    for (idx, value) in values.iter().enumerate() {
        if !value.is_finite() || *value < 0.0 {
            return Err(PCenterError::malformed(format!(
                "Field '{}' entry {} must be finite and non-negative, got {}",
                field, idx, value
            )));
        }
    }
    Ok(())
}

pub fn validate_alpha(field: &str, alpha: f64) -> Result<()> {
    validate_non_negative(field, &[alpha])
}

/// Check an `rows x cols` table, returning it flattened row-major.
pub fn flatten_table<T: Copy>(
    field: &str,
    table: &[Vec<T>],
    rows: usize,
    cols: usize,
) -> Result<Vec<T>> {
    validate_length(field, table, rows)?;
    let mut flat = Vec::with_capacity(rows * cols);
    for (idx, row) in table.iter().enumerate() {
        if row.len() != cols {
            return Err(PCenterError::malformed(format!(
                "Field '{}' row {} has {} entries, expected {}",
                field,
                idx,
                row.len(),
                cols
            )));
        }
        flat.extend_from_slice(row);
    }
    Ok(flat)
}
