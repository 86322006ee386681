//! Translation subsystem.
//!
//! * [`Translator`] — async trait implemented by translation backends.
//! * [`GoogleTranslator`] — HTTP implementation (source auto-detected).
//! * [`TranslationGateway`] — the wrapper the pipeline uses: empty input
//!   short-circuits, and any backend failure returns the original text
//!   unchanged.  Translation is best-effort by contract and must never abort
//!   a turn.

pub mod gateway;
pub mod google;

pub use gateway::{TranslateError, TranslationGateway, Translator};
pub use google::GoogleTranslator;
