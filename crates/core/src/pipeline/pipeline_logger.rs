use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Cross-cutting observer for pipeline events.
///
/// Decouples the orchestration from any particular output mechanism, and is
/// also how the otherwise-silent skip paths (unreadable videos, faceless
/// frames) become visible to an operator.
pub trait PipelineLogger: Send {
    /// Report progress through the video list.
    fn progress(&mut self, current: usize, total: usize);

    /// Record a video that contributed nothing, with the reason.
    fn video_skipped(&mut self, path: &Path, reason: &str);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests where logger
/// output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn video_skipped(&mut self, _path: &Path, _reason: &str) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger: throttled progress via the `log` crate, per-metric
/// accumulation, and a training summary at completion.
pub struct StdoutPipelineLogger {
    throttle: usize,
    metrics: HashMap<String, Vec<f64>>,
    skipped: Vec<String>,
    messages: Vec<String>,
    total_videos: usize,
    start_time: Instant,
}

impl StdoutPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            metrics: HashMap::new(),
            skipped: Vec::new(),
            messages: Vec::new(),
            total_videos: 0,
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was
    /// recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.total_videos == 0 && self.metrics.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Training summary ({} videos, {} skipped, {elapsed:.1}s):",
            self.total_videos,
            self.skipped.len()
        )];

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            let values = &self.metrics[name];
            let total: f64 = values.iter().sum();
            let avg = if values.is_empty() {
                0.0
            } else {
                total / values.len() as f64
            };
            lines.push(format!("  {name}: total {total:.0}  avg {avg:.2}"));
        }

        for path in &self.skipped {
            lines.push(format!("  skipped: {path}"));
        }

        Some(lines.join("\n"))
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_videos = total;
        if total > 0 && (current % self.throttle == 0 || current == total) {
            log::info!("Processing video {current}/{total}");
        }
    }

    fn video_skipped(&mut self, path: &Path, reason: &str) {
        self.skipped.push(path.display().to_string());
        log::warn!("Skipping {}: {reason}", path.display());
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
