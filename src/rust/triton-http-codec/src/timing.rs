// Copyright 2024-2026, NVIDIA CORPORATION & AFFILIATES. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions
// are met:
//  * Redistributions of source code must retain the above copyright
//    notice, this list of conditions and the following disclaimer.
//  * Redistributions in binary form must reproduce the above copyright
//    notice, this list of conditions and the following disclaimer in the
//    documentation and/or other materials provided with the distribution.
//  * Neither the name of NVIDIA CORPORATION nor the names of its
//    contributors may be used to endorse or promote products derived
//    from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS ``AS IS'' AND ANY
// EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED.  IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY
// OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Stage timing.
//!
//! ```rust
//! use triton_http_codec::timing::{timed, Timer};
//!
//! let timer = Timer::start("encode");
//! let encoded = vec![0u8; 16];
//! let elapsed = timer.stop();
//! println!("encoded {} bytes in {elapsed:?}", encoded.len());
//!
//! let sum = timed("sum", || 2 + 2);
//! assert_eq!(sum, 4);
//! ```

use std::time::{Duration, Instant};

/// Measures one stage and logs its duration when stopped.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    label: &'static str,
    started: Instant,
}

impl Timer {
    /// Starts timing a stage.
    #[must_use]
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    /// Returns the stage label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Time elapsed since [`start`](Self::start).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stops the timer, logs the elapsed time at debug level and returns it.
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!(
            stage = self.label,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "stage finished"
        );
        elapsed
    }
}

/// Runs `f` inside a [`Timer`].
pub fn timed<T>(label: &'static str, f: impl FnOnce() -> T) -> T {
    let timer = Timer::start(label);
    let value = f();
    timer.stop();
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonic() {
        let timer = Timer::start("sleep");
        std::thread::sleep(Duration::from_millis(2));
        let first = timer.elapsed();
        assert!(first >= Duration::from_millis(2));
        assert!(timer.stop() >= first);
        assert_eq!(timer.label(), "sleep");
    }

    #[test]
    fn timed_returns_value() {
        assert_eq!(timed("answer", || 42), 42);
    }
}
