//! Fixed-capacity moving average.

/// Mean of the last `capacity` values, updated in O(1).
#[derive(Debug, Clone)]
pub struct MovingAverage {
    buffer: Vec<f32>,
    head: usize,
    len: usize,
    sum: f64,
}

impl MovingAverage {
    /// A capacity of 0 is treated as 1 (no smoothing).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
            sum: 0.0,
        }
    }

    /// Add a value and return the new mean.
    pub fn push(&mut self, value: f32) -> f32 {
        let capacity = self.buffer.len();
        if self.len == capacity {
            self.sum -= self.buffer[self.head] as f64;
        } else {
            self.len += 1;
        }
        self.buffer[self.head] = value;
        self.sum += value as f64;
        self.head = (self.head + 1) % capacity;

        (self.sum / self.len as f64) as f32
    }

    pub fn mean(&self) -> Option<f32> {
        if self.len == 0 {
            None
        } else {
            Some((self.sum / self.len as f64) as f32)
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.sum = 0.0;
    }
}
