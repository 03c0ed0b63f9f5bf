// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;

use rand::{thread_rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

thread_local! {
    // LINT: Guest numbers cannot be generated without a working random number
    // generator.
    #[allow(clippy::expect_used)]
    static RNG: RefCell<ChaCha20Rng> = RefCell::new(ChaCha20Rng::from_rng(thread_rng()).expect("random number generator failed to initialize"));
}

/// Runs `f` against the caller's generator when one is given, and against the
/// thread-local generator otherwise.
pub(crate) fn map_option<F, R>(rng: Option<&mut (dyn RngCore + Send)>, mut f: F) -> R
where
    F: FnMut(&mut dyn RngCore) -> R,
{
    match rng {
        Some(chosen) => f(chosen),
        None => RNG.with(|rng| f(&mut *rng.borrow_mut())),
    }
}
