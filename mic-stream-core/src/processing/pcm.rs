//! Sample conversions used by capture backends to produce mono i16 blocks.

/// Average interleaved frames down to one channel.
///
/// A trailing partial frame is dropped.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Linear-interpolation resampler for a continuous mono stream delivered in
/// chunks of any size.
///
/// The source position of the next output sample and the last input sample
/// carry over between calls, so chunk boundaries neither drop samples nor
/// restart the interpolation phase. Positions are tracked in integer units
/// of `1 / target_rate` source samples and never drift.
#[derive(Debug, Clone)]
pub struct StreamResampler {
    source_rate: u32,
    target_rate: u32,
    // Next output position; index 0 is `previous`, index i is chunk[i - 1].
    position: u64,
    previous: Option<f32>,
}

impl StreamResampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            source_rate,
            target_rate,
            position: 0,
            previous: None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.source_rate == self.target_rate || self.source_rate == 0 || self.target_rate == 0
    }

    /// Resample the next chunk of the stream, appending to `out`.
    pub fn process_into(&mut self, chunk: &[f32], out: &mut Vec<f32>) {
        if self.is_passthrough() {
            out.extend_from_slice(chunk);
            return;
        }

        let (previous, chunk) = match self.previous {
            Some(previous) => (previous, chunk),
            None => match chunk.split_first() {
                Some((first, rest)) => (*first, rest),
                None => return,
            },
        };

        let target = self.target_rate as u64;
        let step = self.source_rate as u64;
        let sample_at = |index: usize| if index == 0 { previous } else { chunk[index - 1] };

        while ((self.position / target) as usize) < chunk.len() {
            let index = (self.position / target) as usize;
            let fraction = (self.position % target) as f32 / target as f32;
            out.push(sample_at(index) * (1.0 - fraction) + sample_at(index + 1) * fraction);
            self.position += step;
        }

        // The last sample of this chunk becomes index 0.
        self.position -= chunk.len() as u64 * target;
        self.previous = Some(chunk.last().copied().unwrap_or(previous));
    }

    pub fn process(&mut self, chunk: &[f32]) -> Vec<f32> {
        let mut out = Vec::new();
        self.process_into(chunk, &mut out);
        out
    }
}

/// Convert `[-1.0, 1.0]` floats to signed 16-bit samples, clamping overs.
pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&sample| {
            let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
            (clamped * i16::MAX as f32) as i16
        })
        .collect()
}
