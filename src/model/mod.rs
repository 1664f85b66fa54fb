pub mod arrangement;
pub mod mixer;
pub mod pattern;
pub mod sample;
pub mod time;

// Re-export commonly used types at the model level.
pub use arrangement::{
    Channel, ChannelUpdate, Clip, ClipInput, ClipSource, PlayState, PlaylistTrack, Transport,
};
pub use mixer::{EffectKey, EffectSlot, MixerTrack};
pub use pattern::{Note, NoteInput, NoteUpdate, Pattern};
pub use sample::SampleRef;
pub use time::{CONFLICT_SHIFT_TICKS, PPQ, TICKS_PER_STEP};
