use bitflags::bitflags;

bitflags! {
    /// Buttons held during one frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        const JUMP = 1 << 0;
        const RIGHT = 1 << 1;
        const LEFT = 1 << 2;
    }
}

/// Input byte the game records when the player restarts.
pub const SUICIDE: u8 = 12;

/// One recorded input byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInput(pub u8);

impl FrameInput {
    pub fn buttons(self) -> Buttons {
        Buttons::from_bits_truncate(self.0)
    }

    pub fn is_suicide(self) -> bool {
        self.0 == SUICIDE
    }
}

/// Frames the player actually controlled. The first recorded frame is an
/// artifact of the recorder and carries no input.
pub fn playable(stream: &[u8]) -> impl Iterator<Item = FrameInput> + '_ {
    stream.iter().skip(1).copied().map(FrameInput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_from_byte() {
        assert_eq!(FrameInput(5).buttons(), Buttons::JUMP | Buttons::LEFT);
        assert_eq!(FrameInput(0).buttons(), Buttons::empty());
        assert!(FrameInput(SUICIDE).is_suicide());
    }

    #[test]
    fn test_playable_skips_first_frame() {
        let frames: Vec<_> = playable(&[0, 3, 1]).collect();
        assert_eq!(frames, vec![FrameInput(3), FrameInput(1)]);
        assert_eq!(playable(&[]).count(), 0);
    }
}
