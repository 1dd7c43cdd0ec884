/// Progress through one upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub completed: usize,
    pub total: usize,
}

impl UploadProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    /// Count one more finished file, successful or not.
    pub fn advance(&mut self) {
        self.completed = (self.completed + 1).min(self.total);
    }

    /// Progress percentage (0-100).
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.completed as f64 / self.total as f64) * 100.0).min(100.0) as u8
        }
    }

    pub fn message(&self) -> String {
        if self.completed == 0 {
            "Processing photos...".to_string()
        } else {
            format!("Uploading {} of {} photos...", self.completed, self.total)
        }
    }
}
