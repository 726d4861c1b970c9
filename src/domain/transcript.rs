/// Result of one successful transcription call.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    /// Heuristic confidence in [0, 1]; not reported by the speech service.
    pub confidence: f64,
    pub language: String,
    /// Duration estimated from file size and a nominal per-format bitrate.
    /// Reporting only; the duration cap is enforced on the platform-declared
    /// value before download.
    pub estimated_duration_secs: f64,
    pub processing_time_secs: f64,
}
