use std::time::{Duration, Instant};

/// Monotonic clock used to time trial phases and reaction times
pub trait Timer: Clone {
    /// Nanoseconds since the timer was created
    fn now(&self) -> u64;

    fn elapsed(&self, since_ns: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since_ns))
    }

    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_stats(&self) -> FrameStats;
}

/// Summary of recorded frame durations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub samples: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl FrameStats {
    pub fn from_durations(frames: &[Duration]) -> Self {
        if frames.is_empty() {
            return Self::default();
        }
        let times: Vec<f64> = frames.iter().map(|d| d.as_nanos() as f64).collect();
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            samples: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

/// Platform-specific high-precision timer
/// Provides sub-millisecond precision for stimulus onsets and reaction times
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frame_times: Vec<Duration>,
    pub max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }

    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.remove(0);
        }
        self.frame_times.push(d);
    }

    fn frame_stats(&self) -> FrameStats {
        FrameStats::from_durations(&self.frame_times)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::core::PCWSTR;
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
        };

        // relative due time in 100 ns intervals
        let due = -((duration.as_nanos() / 100) as i64);

        unsafe {
            match CreateWaitableTimerW(None, true, PCWSTR::null()) {
                Ok(timer) => {
                    if SetWaitableTimer(timer, &due, 0, None, None, false).is_ok() {
                        WaitForSingleObject(timer, INFINITE);
                    }
                    let _ = CloseHandle(timer);
                }
                Err(_) => std::thread::sleep(duration),
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);

                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}
