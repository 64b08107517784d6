/// Write state of a single record instance.
///
/// `Mutable -> Frozen` is the only transition; nothing moves a record back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mutability {
    #[default]
    Mutable,
    Frozen,
}

impl Mutability {
    pub fn is_frozen(self) -> bool {
        matches!(self, Self::Frozen)
    }

    pub(crate) fn freeze(&mut self) {
        *self = Self::Frozen;
    }
}
