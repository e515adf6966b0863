// src/columns.rs
//! Header canonicalization for generic tabular exports.

/// Canonical fields a tabular export column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Nombre,
    Id,
    Departamento,
    Fecha,
    Asistio,
    HoraEntrada,
    MinutosRetraso,
    MinutosSalidaTemprana,
    PrimeraEntrada,
    UltimaSalida,
}

// Checked top to bottom; a header takes the first rule whose keywords all occur in it.
// "salida" contains "id", so exit columns land on the id rule before their own.
const HEADER_RULES: &[(&[&str], CanonicalField)] = &[
    (&["nombre"], CanonicalField::Nombre),
    (&["id"], CanonicalField::Id),
    (&["cedula"], CanonicalField::Id),
    (&["departamento"], CanonicalField::Departamento),
    (&["area"], CanonicalField::Departamento),
    (&["fecha"], CanonicalField::Fecha),
    (&["asist"], CanonicalField::Asistio),
    (&["entrada", "hora"], CanonicalField::HoraEntrada),
    (&["retraso"], CanonicalField::MinutosRetraso),
    (&["salida", "temprana"], CanonicalField::MinutosSalidaTemprana),
    (&["primera", "entrada"], CanonicalField::PrimeraEntrada),
    (&["ultima", "salida"], CanonicalField::UltimaSalida),
];

impl CanonicalField {
    /// Classifies a raw header cell, or `None` when no rule matches.
    pub fn classify(header: &str) -> Option<Self> {
        let key = header.trim().to_lowercase();
        HEADER_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().all(|kw| key.contains(kw)))
            .map(|(_, field)| *field)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Nombre => "nombre",
            CanonicalField::Id => "id",
            CanonicalField::Departamento => "departamento",
            CanonicalField::Fecha => "fecha",
            CanonicalField::Asistio => "asistio",
            CanonicalField::HoraEntrada => "hora_entrada",
            CanonicalField::MinutosRetraso => "minutos_retraso",
            CanonicalField::MinutosSalidaTemprana => "minutos_salida_temprana",
            CanonicalField::PrimeraEntrada => "primera_entrada",
            CanonicalField::UltimaSalida => "ultima_salida",
        }
    }
}

/// Picks `;` when the header has more semicolons than commas, `,` otherwise.
pub fn infer_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}
