use std::io::Write;

use fitsio::FitsFile;
use fitsio::hdu::HduInfo;

use lightcurve_fetch::{ArchiveError, LightCurve};

/// Alias columns placed right after `time`, as `(alias, source column)`.
const ALIASES: &[(&str, &str)] = &[
    ("flux", "pdcsap_flux"),
    ("flux_err", "pdcsap_flux_err"),
    ("quality", "sap_quality"),
];

/// Decode a Kepler light-curve FITS file into a table.
///
/// Reads the `LIGHTCURVE` extension (or the first extension if it has no
/// such name). Every column that reads as a number becomes an `f64`
/// column with a lowercased name; anything else is dropped. The output
/// starts with `time`, then `flux`, `flux_err` and `quality` when their
/// source columns exist, then the remaining columns in file order.
pub fn decode_light_curve(bytes: &[u8]) -> Result<LightCurve, ArchiveError> {
    // cfitsio reads from a path, so spill the download to disk first
    let mut file = tempfile::Builder::new()
        .prefix("lightcurve-")
        .suffix(".fits")
        .tempfile()
        .map_err(|e| ArchiveError::Other(format!("failed to stage FITS file: {e}")))?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| ArchiveError::Other(format!("failed to stage FITS file: {e}")))?;

    let mut fptr = FitsFile::open(file.path())
        .map_err(|e| ArchiveError::Parse(format!("not a FITS file: {e}")))?;

    let hdu = fptr
        .hdu("LIGHTCURVE")
        .or_else(|_| fptr.hdu(1usize))
        .map_err(|e| ArchiveError::Parse(format!("no light curve extension: {e}")))?;

    let (names, num_rows) = match &hdu.info {
        HduInfo::TableInfo {
            column_descriptions,
            num_rows,
        } => (
            column_descriptions
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>(),
            *num_rows,
        ),
        _ => {
            return Err(ArchiveError::Parse(
                "light curve extension is not a table".into(),
            ));
        }
    };

    let mut raw: Vec<(String, Vec<f64>)> = Vec::with_capacity(names.len());
    for name in &names {
        match hdu.read_col::<f64>(&mut fptr, name) {
            Ok(values) if values.len() == num_rows => {
                raw.push((name.trim().to_ascii_lowercase(), values));
            }
            Ok(values) => {
                tracing::debug!(
                    column = %name,
                    rows = values.len(),
                    num_rows,
                    "dropping ragged column"
                );
            }
            Err(e) => {
                tracing::debug!(column = %name, error = %e, "dropping non-numeric column");
            }
        }
    }

    assemble(raw)
}

/// Order decoded columns and add aliases.
fn assemble(raw: Vec<(String, Vec<f64>)>) -> Result<LightCurve, ArchiveError> {
    let find = |name: &str| raw.iter().find(|(n, _)| n == name).map(|(_, v)| v);

    let time = find("time")
        .ok_or_else(|| ArchiveError::Parse("light curve has no TIME column".into()))?;

    let mut curve = LightCurve::new();
    let push = |curve: &mut LightCurve, name: &str, values: Vec<f64>| {
        curve
            .push_column(name, values)
            .map_err(|e| ArchiveError::Parse(e.to_string()))
    };

    push(&mut curve, "time", time.clone())?;
    for &(alias, source) in ALIASES {
        if find(alias).is_none()
            && let Some(values) = find(source)
        {
            push(&mut curve, alias, values.clone())?;
        }
    }
    for (name, values) in &raw {
        if name == "time" || curve.column(name).is_some() {
            continue;
        }
        push(&mut curve, name, values.clone())?;
    }

    Ok(curve)
}
