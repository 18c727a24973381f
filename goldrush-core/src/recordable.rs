/*!
The Recordable module defines the [`Recordable`] trait which provides method
to save the state of a struct to be analysed afterward.
*/

/// Trait providing save state method.
///
/// The generic `RecordType` is the Record which is produced.
/// See [`ControllerRecord`](crate::controllers::ControllerRecord) or
/// [`ArenaRecord`](crate::arena::ArenaRecord).
pub trait Recordable<RecordType> {
    /// Generate the current state Record.
    fn record(&self) -> RecordType;
}
