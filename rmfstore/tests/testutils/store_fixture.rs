//! Isolated store instances for integration tests
//!
//! Every fixture owns its temporary directory, so tests can run in
//! parallel. Handles must be dropped before `reopen`, since the sled
//! driver holds an exclusive lock on its directory.

use rmfstore::{Arity, FileHandle, NodeHandle, NodeType, SetType, StoreConfig};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavour {
    /// Columnar layout on a sled database
    ColumnarSled,
    /// Columnar layout on the in-memory driver
    ColumnarMemory,
    /// Flat layout in a file
    FlatFile,
    /// Flat layout in a memory buffer
    FlatBuffer,
}

impl Flavour {
    pub const ALL: [Flavour; 4] = [
        Flavour::ColumnarSled,
        Flavour::ColumnarMemory,
        Flavour::FlatFile,
        Flavour::FlatBuffer,
    ];

    /// True if the fixture lives in a file other handles can open
    pub fn is_on_disk(self) -> bool {
        matches!(self, Flavour::ColumnarSled | Flavour::FlatFile)
    }
}

pub struct StoreFixture {
    file: Option<FileHandle>,
    flavour: Flavour,
    path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl StoreFixture {
    pub fn new(flavour: Flavour) -> Self {
        super::init_logging();
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir
            .path()
            .join(format!("store_{}.rmf", fastrand::u64(..)));
        let file = match flavour {
            Flavour::ColumnarSled => FileHandle::create(&path),
            Flavour::ColumnarMemory => {
                FileHandle::create_with_config(&path, &StoreConfig::in_memory())
            }
            Flavour::FlatFile => FileHandle::create_with_config(&path, &StoreConfig::flat()),
            Flavour::FlatBuffer => FileHandle::create_in_buffer(),
        }
        .expect("Failed to create store");
        Self {
            file: Some(file),
            flavour,
            path,
            _temp_dir: temp_dir,
        }
    }

    pub fn columnar() -> Self {
        Self::new(Flavour::ColumnarSled)
    }

    pub fn flat() -> Self {
        Self::new(Flavour::FlatFile)
    }

    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    pub fn file(&self) -> &FileHandle {
        self.file.as_ref().expect("fixture file is open")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush, close and open the store again
    ///
    /// In-memory columnar stores can't be closed, so they reload instead.
    /// Buffers round-trip through their bytes.
    pub fn reopen(&mut self) {
        let file = self.file.take().expect("fixture file is open");
        file.flush().expect("Failed to flush store");
        let reopened = match self.flavour {
            Flavour::ColumnarSled | Flavour::FlatFile => {
                drop(file);
                FileHandle::open(&self.path)
            }
            Flavour::ColumnarMemory => file.reload().map(|_| file),
            Flavour::FlatBuffer => {
                let bytes = file.to_buffer().expect("Failed to serialize buffer");
                FileHandle::open_from_buffer(&bytes)
            }
        };
        self.file = Some(reopened.expect("Failed to reopen store"));
    }

    /// Small molecule: two chains of atoms, one linked atom and two bonds
    ///
    /// ```text
    /// root
    ///   chain A: a0 a1 a2
    ///   chain B: b0 b1, plus a link to a1
    /// ```
    pub fn insert_sample(&self) -> SampleIds {
        let file = self.file();
        let root = file.get_root_node();
        let chain_a = root
            .add_child("chain A", NodeType::Representation)
            .expect("add chain A");
        let atoms_a: Vec<NodeHandle> = (0..3)
            .map(|i| {
                chain_a
                    .add_child(&format!("a{}", i), NodeType::Representation)
                    .expect("add atom")
            })
            .collect();
        let chain_b = root
            .add_child("chain B", NodeType::Representation)
            .expect("add chain B");
        let atoms_b: Vec<NodeHandle> = (0..2)
            .map(|i| {
                chain_b
                    .add_child(&format!("b{}", i), NodeType::Representation)
                    .expect("add atom")
            })
            .collect();
        chain_b
            .add_existing_child(&atoms_a[1])
            .expect("link a1 under chain B");
        file.add_node_set(&[atoms_a[0].clone(), atoms_a[1].clone()], SetType::Bond)
            .expect("bond a0-a1");
        file.add_node_set(&[atoms_b[0].clone(), atoms_b[1].clone()], SetType::Bond)
            .expect("bond b0-b1");
        assert_eq!(file.get_number_of_node_sets(Arity::PAIR), 2);
        SampleIds {
            chain_a: chain_a.id().0,
            atoms_a: atoms_a.iter().map(|n| n.id().0).collect(),
            chain_b: chain_b.id().0,
            atoms_b: atoms_b.iter().map(|n| n.id().0).collect(),
        }
    }
}

/// Node ids of the sample molecule, valid across reopen
#[derive(Debug, Clone)]
pub struct SampleIds {
    pub chain_a: u32,
    pub atoms_a: Vec<u32>,
    pub chain_b: u32,
    pub atoms_b: Vec<u32>,
}
