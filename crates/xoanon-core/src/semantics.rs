/// High-level semantic role of a scene node, similar to ARIA roles.
///
/// Locator searches are typed by role: "find every button under this
/// root", "find the text field with this id".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Text,
    Button,
    TextField,
    Container,
    Checkbox,
    RadioButton,
    Switch,
    Slider,
    ProgressBar,
}
