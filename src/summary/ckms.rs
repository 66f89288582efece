//! Targeted-quantile stream estimation (Cormode, Korn, Muthukrishnan,
//! Srivastava, "Effective Computation of Biased Quantiles over Data Streams")
use crate::collector::QuantileDefinition;

/// Observations buffered before they are merged into the sample list
const BUFFER_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy)]
struct Sample {
    value: f64,
    /// Rank difference to the previous sample
    g: f64,
    /// Rank uncertainty of this sample
    delta: f64,
}

/// A compressed stream that answers the configured quantiles within their errors
#[derive(Debug, Clone)]
pub(crate) struct Ckms {
    targets: Vec<QuantileDefinition>,
    samples: Vec<Sample>,
    buffer: Vec<f64>,
    n: f64,
}

impl Ckms {
    pub(crate) fn new(targets: &[QuantileDefinition]) -> Self {
        Self {
            targets: targets.to_vec(),
            samples: Vec::new(),
            buffer: Vec::with_capacity(BUFFER_CAPACITY),
            n: 0.0,
        }
    }

    pub(crate) fn insert(&mut self, value: f64) {
        self.buffer.push(value);
        if self.buffer.len() >= BUFFER_CAPACITY {
            self.flush();
        }
    }

    /// Estimate quantile `q`, NaN when nothing has been observed
    pub(crate) fn query(&mut self, q: f64) -> f64 {
        self.flush();

        let Some(first) = self.samples.first() else {
            return f64::NAN;
        };

        let mut target = (q * self.n).ceil();
        target += (self.invariant(target) / 2.0).ceil();

        let mut previous = *first;
        let mut rank = 0.0;
        for current in &self.samples[1..] {
            rank += previous.g;
            if rank + current.g + current.delta > target {
                return previous.value;
            }
            previous = *current;
        }

        previous.value
    }

    /// Allowed rank error at `rank` given the current stream length
    fn invariant(&self, rank: f64) -> f64 {
        self.targets
            .iter()
            .map(|t| {
                // q == 0 only has the upper branch and q == 1 only the lower one
                let below_rank = if t.quantile <= 0.0 {
                    false
                } else if t.quantile >= 1.0 {
                    true
                } else {
                    t.quantile * self.n <= rank
                };

                if below_rank {
                    2.0 * t.error * rank / t.quantile
                } else {
                    2.0 * t.error * (self.n - rank) / (1.0 - t.quantile)
                }
            })
            .fold(f64::MAX, f64::min)
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let mut incoming = std::mem::take(&mut self.buffer);
        incoming.sort_by(f64::total_cmp);

        let mut existing = std::mem::take(&mut self.samples).into_iter().peekable();
        let mut merged = Vec::with_capacity(existing.len() + incoming.len());
        let mut rank = 0.0;

        for value in incoming.drain(..) {
            while let Some(sample) = existing.next_if(|s| s.value <= value) {
                rank += sample.g;
                merged.push(sample);
            }

            self.n += 1.0;
            let delta = if merged.is_empty() || existing.peek().is_none() {
                0.0
            } else {
                (self.invariant(rank) - 1.0).floor().max(0.0)
            };

            merged.push(Sample {
                value,
                g: 1.0,
                delta,
            });
            rank += 1.0;
        }
        merged.extend(existing);

        self.samples = merged;
        self.buffer = incoming;
        self.compress();
    }

    fn compress(&mut self) {
        if self.samples.len() < 2 {
            return;
        }

        let mut xi = self.samples.len() - 1;
        let mut rank = self.n - 1.0 - self.samples[xi].g;

        for i in (0..self.samples.len() - 1).rev() {
            let c = self.samples[i];
            let x = self.samples[xi];

            if c.g + x.g + x.delta <= self.invariant(rank) {
                self.samples[xi].g += c.g;
                self.samples.remove(i);
                xi -= 1;
            } else {
                xi = i;
            }
            rank -= c.g;
        }
    }

    #[cfg(test)]
    fn sample_len(&self) -> usize {
        self.samples.len()
    }
}
