//! Rollover-safe reconstruction of narrow hardware counters.

/// Update a wide counter from a newly observed narrow (mod `modulo`) value.
///
/// The result is congruent to `new_mod` modulo `modulo` and lies in
/// `[old - max_backwards, old - max_backwards + modulo)`, so the counter may
/// slip back by at most `max_backwards` and otherwise only moves forward.
/// `modulo` must be a power of two. All arithmetic wraps at 32 bits.
#[inline]
pub fn update_counter_modulo(old: u32, new_mod: u32, modulo: u32, max_backwards: u32) -> u32 {
    let mask = modulo.wrapping_sub(1);
    let mut floor = old.wrapping_sub(max_backwards);
    if (floor & mask) > (new_mod & mask) {
        floor = floor.wrapping_add(modulo);
    }
    (floor & !mask) | (new_mod & mask)
}
