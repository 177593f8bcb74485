pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn verifier_error(msg: String) -> crate::error::EoError {
    crate::error::EoError::VerifierError(msg)
}
