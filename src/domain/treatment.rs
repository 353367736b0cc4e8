/// Reglas de tratamiento, evaluadas en orden. Gana la primera coincidencia.
const RULES: &[(&str, &str)] = &[
    ("blight", "Use Mancozeb or Chlorothalonil fungicide."),
    ("mildew", "Apply sulfur or potassium bicarbonate spray."),
    ("rust", "Use a fungicide with myclobutanil."),
    ("spot", "Copper-based fungicide is effective."),
    ("healthy", "No treatment needed."),
];

pub const FALLBACK_ADVICE: &str = "Consult a local expert for targeted management.";

/// Recomendación para una etiqueta de enfermedad (coincidencia por subcadena,
/// sin distinguir mayúsculas).
pub fn recommend(label: &str) -> &'static str {
    let label = label.to_lowercase();
    RULES
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, advice)| *advice)
        .unwrap_or(FALLBACK_ADVICE)
}
