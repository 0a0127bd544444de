//! Saturating per-channel gain lookup tables.

/// Sample types a gain table can be built over.
pub trait GainSample: Copy + Send + Sync + 'static {
    const MAX: u32;
    fn from_u32(v: u32) -> Self;
    fn index(self) -> usize;
}

impl GainSample for u8 {
    const MAX: u32 = u8::MAX as u32;
    #[inline(always)]
    fn from_u32(v: u32) -> Self {
        v as u8
    }
    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

impl GainSample for u16 {
    const MAX: u32 = u16::MAX as u32;
    #[inline(always)]
    fn from_u32(v: u32) -> Self {
        v as u16
    }
    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

/// Gains this close to one are treated as exactly one.
const UNITY_TOLERANCE: f32 = 1e-4;

/// `table[i] = clip(round(i * gain))` over the full range of `T`.
#[derive(Clone)]
pub struct GainTable<T: GainSample> {
    entries: Option<Box<[T]>>,
}

impl<T: GainSample> GainTable<T> {
    pub fn new(gain: f32) -> Self {
        if (gain - 1.0).abs() < UNITY_TOLERANCE {
            return Self::unity();
        }
        let max = T::MAX as f32;
        let entries = (0..=T::MAX)
            .map(|i| T::from_u32((i as f32 * gain).round().clamp(0.0, max) as u32))
            .collect::<Vec<T>>()
            .into_boxed_slice();
        Self { entries: Some(entries) }
    }

    pub fn unity() -> Self {
        Self { entries: None }
    }

    pub fn is_unity(&self) -> bool {
        self.entries.is_none()
    }

    #[inline(always)]
    pub fn apply(&self, v: T) -> T {
        match &self.entries {
            Some(table) => table[v.index()],
            None => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_unity_short_circuits() {
        let table = GainTable::<u16>::new(1.00001);
        assert!(table.is_unity());
        assert_eq!(table.apply(12345), 12345);
    }

    #[test]
    fn gain_saturates() {
        let table = GainTable::<u8>::new(2.0);
        assert_eq!(table.apply(10), 20);
        assert_eq!(table.apply(127), 254);
        assert_eq!(table.apply(128), 255);
        assert_eq!(table.apply(255), 255);

        let table = GainTable::<u16>::new(0.5);
        assert_eq!(table.apply(65535), 32768);
        assert_eq!(table.apply(3), 2);
    }
}
