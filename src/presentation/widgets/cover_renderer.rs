//! Terminal graphics protocol selection for cover images.

use ratatui_image::picker::{Capability, Picker, ProtocolType};
use tracing::debug;

/// Owns the protocol picker every cover surface encodes through.
pub struct CoverRenderer {
    picker: Picker,
}

impl CoverRenderer {
    /// Queries the terminal for graphics support.
    ///
    /// Must run before the event stream starts reading stdin. Falls back to
    /// half blocks when the terminal does not answer.
    #[must_use]
    pub fn new() -> Self {
        let mut picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::halfblocks());

        let caps = picker.capabilities();
        let has_sixel = caps.iter().any(|c| matches!(c, Capability::Sixel));
        let has_kitty = caps.iter().any(|c| matches!(c, Capability::Kitty));

        if has_sixel && !has_kitty && picker.protocol_type() == ProtocolType::Halfblocks {
            picker.set_protocol_type(ProtocolType::Sixel);
        }

        debug!(protocol = ?picker.protocol_type(), "Cover renderer ready");
        Self { picker }
    }

    /// A renderer that never queries the terminal.
    #[must_use]
    pub fn halfblocks() -> Self {
        Self {
            picker: Picker::halfblocks(),
        }
    }

    #[must_use]
    pub fn protocol_type(&self) -> ProtocolType {
        self.picker.protocol_type()
    }

    #[must_use]
    pub const fn picker(&self) -> &Picker {
        &self.picker
    }
}

impl Default for CoverRenderer {
    fn default() -> Self {
        Self::halfblocks()
    }
}

impl std::fmt::Debug for CoverRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverRenderer")
            .field("protocol", &self.picker.protocol_type())
            .finish()
    }
}
