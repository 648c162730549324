//! Domain Services
//!
//! Pure logic over domain entities. File access goes through the
//! [`FileSystem`](crate::domain::ports::FileSystem) port so every service can
//! run against a temp directory in tests.

pub mod classifier;
pub mod composer;
pub mod head;
pub mod html;
pub mod impact;
pub mod layout_resolver;
pub mod reference;

pub use classifier::{
    ClassificationResult, ClassifierOptions, ClassifierWarning, FileAction, FileClassifier, Tier,
};
pub use composer::{
    ComposeOptions, ComposeWarning, ComposedDocument, Composer, Composition, ImportNode,
    SlotContent, DEFAULT_MAX_DEPTH, IMPORT_ATTR,
};
pub use head::{HeadElement, HeadKey, HeadSet};
pub use impact::{ChangeImpact, ChangeImpactAnalyzer, ImpactLevel};
pub use layout_resolver::{
    LayoutOptions, LayoutResolution, LayoutResolver, LayoutRule, LayoutSource, ResolutionStep,
    DEFAULT_LAYOUT_FILENAME, LAYOUT_ATTR,
};
pub use reference::{normalize_path, Lookup, ReferenceResolver, DEFAULT_INCLUDES_DIR};
