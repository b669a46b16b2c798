/// Lifecycle of one dataset in the geometry cache.
///
/// Absent → Downloading → Decoding → Resident, or → Failed from either
/// in-flight state. A failed dataset may be requested again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ResidencyState {
    #[default]
    Absent,
    Downloading,
    Decoding,
    Resident,
    Failed,
}
