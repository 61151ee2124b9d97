/// The persistence side of a managed record.
///
/// Attribute values are exchanged as strings; the attachment layer only ever
/// stores a filename and reads identity fields for path templates.
pub trait Record {
    /// Current in-memory value of an attribute
    fn attribute(&self, name: &str) -> Option<String>;

    /// Value as last loaded from or written to persistence
    fn old_attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&mut self, name: &str, value: Option<String>);

    /// True until the record has been inserted
    fn is_new_record(&self) -> bool;

    fn is_attribute_changed(&self, name: &str) -> bool {
        self.attribute(name) != self.old_attribute(name)
    }
}
