#![allow(dead_code)]

const BLOCK: usize = 2880;

/// A binary table column for [`bintable`].
pub enum Col {
    /// `D`: 64-bit float
    F64(&'static str, Vec<f64>),
    /// `E`: 32-bit float
    F32(&'static str, Vec<f32>),
    /// `J`: 32-bit integer
    I32(&'static str, Vec<i32>),
}

impl Col {
    fn name(&self) -> &'static str {
        match self {
            Col::F64(n, _) | Col::F32(n, _) | Col::I32(n, _) => n,
        }
    }

    fn tform(&self) -> &'static str {
        match self {
            Col::F64(..) => "D",
            Col::F32(..) => "E",
            Col::I32(..) => "J",
        }
    }

    fn width(&self) -> usize {
        match self {
            Col::F64(..) => 8,
            Col::F32(..) | Col::I32(..) => 4,
        }
    }

    fn len(&self) -> usize {
        match self {
            Col::F64(_, v) => v.len(),
            Col::F32(_, v) => v.len(),
            Col::I32(_, v) => v.len(),
        }
    }

    fn write_cell(&self, row: usize, out: &mut Vec<u8>) {
        match self {
            Col::F64(_, v) => out.extend_from_slice(&v[row].to_be_bytes()),
            Col::F32(_, v) => out.extend_from_slice(&v[row].to_be_bytes()),
            Col::I32(_, v) => out.extend_from_slice(&v[row].to_be_bytes()),
        }
    }
}

fn card(text: String) -> Vec<u8> {
    let mut bytes = text.into_bytes();
    bytes.resize(80, b' ');
    bytes
}

fn value_card(key: &str, value: impl std::fmt::Display) -> Vec<u8> {
    card(format!("{key:<8}= {value:>20}"))
}

fn string_card(key: &str, value: &str) -> Vec<u8> {
    card(format!("{key:<8}= '{value:<8}'"))
}

fn header(cards: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out: Vec<u8> = cards.into_iter().flatten().collect();
    out.extend(card("END".into()));
    pad(&mut out, b' ');
    out
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let rem = bytes.len() % BLOCK;
    if rem != 0 {
        bytes.resize(bytes.len() + BLOCK - rem, fill);
    }
}

/// A FITS file with an empty primary HDU and one binary table extension.
pub fn bintable(extname: &str, cols: &[Col]) -> Vec<u8> {
    let rows = cols.first().map(Col::len).unwrap_or(0);
    let row_bytes: usize = cols.iter().map(Col::width).sum();

    let mut out = header(vec![
        value_card("SIMPLE", "T"),
        value_card("BITPIX", 8),
        value_card("NAXIS", 0),
        value_card("EXTEND", "T"),
    ]);

    let mut cards = vec![
        string_card("XTENSION", "BINTABLE"),
        value_card("BITPIX", 8),
        value_card("NAXIS", 2),
        value_card("NAXIS1", row_bytes),
        value_card("NAXIS2", rows),
        value_card("PCOUNT", 0),
        value_card("GCOUNT", 1),
        value_card("TFIELDS", cols.len()),
    ];
    for (i, col) in cols.iter().enumerate() {
        cards.push(string_card(&format!("TTYPE{}", i + 1), col.name()));
        cards.push(string_card(&format!("TFORM{}", i + 1), col.tform()));
    }
    cards.push(string_card("EXTNAME", extname));
    out.extend(header(cards));

    let mut data = Vec::with_capacity(rows * row_bytes);
    for row in 0..rows {
        for col in cols {
            col.write_cell(row, &mut data);
        }
    }
    pad(&mut data, 0);
    out.extend(data);
    out
}

/// A small Kepler-shaped light curve.
pub fn kepler_light_curve() -> Vec<u8> {
    bintable(
        "LIGHTCURVE",
        &[
            Col::F64("TIME", vec![131.5, 131.52, 131.54]),
            Col::F64("TIMECORR", vec![0.001, 0.001, 0.001]),
            Col::I32("CADENCENO", vec![1105, 1106, 1107]),
            Col::F32("SAP_FLUX", vec![2.5, 3.5, 4.5]),
            Col::F32("PDCSAP_FLUX", vec![10.5, 11.25, 12.0]),
            Col::F32("PDCSAP_FLUX_ERR", vec![0.5, 0.25, 0.125]),
            Col::I32("SAP_QUALITY", vec![0, 128, 0]),
        ],
    )
}
