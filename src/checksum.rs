//! Checksum utilities for IR determinism checks

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::codegen::Ir;

/// SHA256 fingerprint of a serialized IR
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrChecksum(String);

impl IrChecksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Checksum of the compact JSON form of `ir`.
    ///
    /// Every map in the IR is ordered, so equal IRs serialize to equal bytes.
    pub fn of(ir: &Ir) -> serde_json::Result<Self> {
        let bytes = serde_json::to_vec(ir)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Does `ir` still match this checksum?
    pub fn verify(&self, ir: &Ir) -> bool {
        Self::of(ir).map(|c| c == *self).unwrap_or(false)
    }
}

impl fmt::Display for IrChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IrChecksum {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::IrGenerator;
    use crate::config::GenerateConfig;
    use crate::schema::{SchemaTreeBuilder, TypeDescriptor, TypeKind};

    #[test]
    fn test_checksum_consistency() {
        let mut b = SchemaTreeBuilder::new();
        let m = b.module("mod", "urn:mod", None);
        let c = b.container(m, "c");
        b.leaf(c, "mode", TypeDescriptor::enumeration(&["a", "b"]));
        let tree = b.build();

        let generator = IrGenerator::new(&tree, GenerateConfig::default());
        let first = IrChecksum::of(&generator.generate().unwrap()).unwrap();
        let second = generator.generate().unwrap();
        assert!(first.verify(&second));
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(IrChecksum::from_bytes(b"one"), IrChecksum::from_bytes(b"two"));
        assert_ne!(IrChecksum::of(&Ir::default()).unwrap(), IrChecksum::from_bytes(b""));
    }
}
