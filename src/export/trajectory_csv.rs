use std::path::Path;

use crate::export::ExportError;
use crate::stimulus::sample::Coordinates;

pub const HEADER: [&str; 4] = ["X1", "Y1", "X2", "Y2"];

/// Write `X1,Y1,X2,Y2` rows. Values use the shortest round-trip representation.
pub fn write_coordinates(path: &Path, coords: &Coordinates) -> Result<(), ExportError> {
    if !coords.is_rectangular() {
        return Err(ExportError::Malformed {
            path: path.display().to_string(),
            row: 0,
            reason: "coordinate columns differ in length".to_string(),
        });
    }
    let csv_err = |source| ExportError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(HEADER).map_err(csv_err)?;
    for i in 0..coords.len() {
        let row = coords.row(i);
        wtr.write_record(row.iter().map(|v| v.to_string()))
            .map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

/// Read a trajectory table by column name; extra columns are ignored.
pub fn read_coordinates(path: &Path) -> Result<Coordinates, ExportError> {
    let path_str = path.display().to_string();
    let csv_err = |source| ExportError::Csv {
        path: path_str.clone(),
        source,
    };
    let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let mut cols = [0usize; 4];
    for (slot, name) in cols.iter_mut().zip(HEADER) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ExportError::MissingColumn {
                path: path_str.clone(),
                column: name,
            })?;
    }

    let mut coords = Coordinates::default();
    for (row_idx, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let mut row = [0.0f64; 4];
        for (value, &col) in row.iter_mut().zip(cols.iter()) {
            let field = record.get(col).unwrap_or("").trim();
            let malformed = |reason: String| ExportError::Malformed {
                path: path_str.clone(),
                row: row_idx + 1,
                reason,
            };
            let parsed: f64 = field
                .parse()
                .map_err(|_| malformed(format!("`{field}` is not a number")))?;
            if !parsed.is_finite() {
                return Err(malformed(format!("`{field}` is not a finite number")));
            }
            *value = parsed;
        }
        coords.push(row);
    }
    Ok(coords)
}
