//! Runtime report of which SIMD kernels this host dispatches to.
//!
//! Informational only: the scalar and vectorized paths produce the same scores
//! within floating-point tolerance.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub avx2: bool,
    pub neon: bool,
    /// Whether batch calls dispatch to a hand-written vector kernel.
    pub vectorized: bool,
}

/// AVX2 support, detected at runtime (cached by std after the first call).
#[inline]
pub fn has_avx2() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("avx2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

#[inline]
pub fn has_neon() -> bool {
    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("neon")
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        false
    }
}

/// Only AVX2 kernels are hand-written; other hosts run the scalar path.
#[inline]
pub fn vectorized_path_active() -> bool {
    has_avx2()
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        avx2: has_avx2(),
        neon: has_neon(),
        vectorized: vectorized_path_active(),
    }
}
