//! Backend equivalence
//!
//! Replays one randomly generated operation script on several store
//! flavours and checks that every query answers the same everywhere.

#[path = "testutils/mod.rs"]
mod testutils;

use rmfstore::utility::{get_equal_frame, get_equal_structure};
use rmfstore::{Arity, FileHandle, Key, NodeId, NodeType, SetType, StoredValue};
use testutils::store_fixture::{Flavour, StoreFixture};

const FRAMES: u32 = 6;
const NODE_TYPES: [NodeType; 4] = [
    NodeType::Representation,
    NodeType::Geometry,
    NodeType::Feature,
    NodeType::Custom,
];
const CATEGORIES: [&str; 3] = ["physics", "shape", "state"];

#[derive(Debug, Clone, Copy)]
enum AnyKey {
    Float(Key<f64>),
    Int(Key<i64>),
}

struct Replay {
    fixtures: Vec<StoreFixture>,
    /// Non-link node ids, identical in every file
    nodes: Vec<u32>,
    /// One key per fixture for each created key
    keys: Vec<Vec<AnyKey>>,
    rng: fastrand::Rng,
}

impl Replay {
    fn new(seed: u64, flavours: &[Flavour]) -> Self {
        Self {
            fixtures: flavours.iter().map(|f| StoreFixture::new(*f)).collect(),
            nodes: vec![0],
            keys: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn files(&self) -> impl Iterator<Item = &FileHandle> {
        self.fixtures.iter().map(StoreFixture::file)
    }

    fn pick_node(&mut self) -> u32 {
        self.nodes[self.rng.usize(..self.nodes.len())]
    }

    fn add_child(&mut self, step: usize) {
        let parent = self.pick_node();
        let node_type = NODE_TYPES[self.rng.usize(..NODE_TYPES.len())];
        let name = format!("n{}", step);
        let ids: Vec<u32> = self
            .files()
            .map(|file| {
                file.get_node_from_id(NodeId(parent))
                    .unwrap()
                    .add_child(&name, node_type)
                    .unwrap()
                    .id()
                    .0
            })
            .collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]), "ids diverged: {:?}", ids);
        self.nodes.push(ids[0]);
    }

    fn add_key(&mut self) {
        let category_name = CATEGORIES[self.rng.usize(..CATEGORIES.len())];
        let per_frame = self.rng.bool();
        let float = self.rng.bool();
        let name = format!("k{}", self.keys.len());
        let keys = self
            .files()
            .map(|file| {
                let category = file
                    .get_category_always(Arity::NODE, category_name)
                    .unwrap();
                if float {
                    AnyKey::Float(file.add_key::<f64>(category, &name, per_frame).unwrap())
                } else {
                    AnyKey::Int(file.add_key::<i64>(category, &name, per_frame).unwrap())
                }
            })
            .collect();
        self.keys.push(keys);
    }

    fn add_pair(&mut self) {
        let (a, b) = (self.pick_node(), self.pick_node());
        if a == b {
            return;
        }
        for file in self.files() {
            let members = [
                file.get_node_from_id(NodeId(a)).unwrap(),
                file.get_node_from_id(NodeId(b)).unwrap(),
            ];
            file.add_node_set(&members, SetType::Bond).unwrap();
        }
    }

    fn add_link(&mut self) {
        let (parent, child) = (self.pick_node(), self.pick_node());
        if child == 0 {
            return;
        }
        for file in self.files() {
            let child = file.get_node_from_id(NodeId(child)).unwrap();
            file.get_node_from_id(NodeId(parent))
                .unwrap()
                .add_existing_child(&child)
                .unwrap();
        }
    }

    fn set_value(&mut self) {
        if self.keys.is_empty() {
            return;
        }
        let key = self.rng.usize(..self.keys.len());
        let node = self.pick_node();
        let frame = self.rng.u32(..FRAMES);
        let float = self.rng.f64() * 100.0;
        let int = self.rng.i64(-1000..1000);
        for (file, key) in self
            .fixtures
            .iter()
            .map(StoreFixture::file)
            .zip(&self.keys[key])
        {
            let node = file.get_node_from_id(NodeId(node)).unwrap();
            match key {
                AnyKey::Float(key) => node.set_value(*key, Some(frame), float).unwrap(),
                AnyKey::Int(key) => node.set_value(*key, Some(frame), int).unwrap(),
            }
        }
    }

    fn run(&mut self, steps: usize) {
        for step in 0..steps {
            match self.rng.u32(..100) {
                0..=14 => self.add_child(step),
                15..=19 => self.add_key(),
                20..=23 => self.add_pair(),
                24..=26 => self.add_link(),
                _ => self.set_value(),
            }
            if step % 97 == 96 {
                for fixture in &mut self.fixtures {
                    fixture.reopen();
                }
            }
        }
    }

    fn check(&self) {
        let reference = self.fixtures[0].file();
        for (i, fixture) in self.fixtures.iter().enumerate().skip(1) {
            let file = fixture.file();
            check_structure(reference, file);
            for keys in &self.keys {
                check_key(reference, &keys[0], file, &keys[i]);
            }
            assert!(get_equal_structure(reference, file).unwrap());
            for frame in 0..FRAMES {
                assert!(get_equal_frame(reference, file, frame).unwrap());
            }
        }
    }
}

fn check_structure(a: &FileHandle, b: &FileHandle) {
    assert_eq!(a.get_number_of_nodes(), b.get_number_of_nodes());
    for id in 0..a.get_number_of_nodes() {
        let (left, right) = (
            a.get_node_from_id(NodeId(id)).unwrap(),
            b.get_node_from_id(NodeId(id)).unwrap(),
        );
        assert_eq!(left.get_name().unwrap(), right.get_name().unwrap());
        assert_eq!(left.get_type().unwrap(), right.get_type().unwrap());
        let children = |node: &rmfstore::NodeHandle| -> Vec<NodeId> {
            node.get_children()
                .unwrap()
                .iter()
                .map(|child| child.id())
                .collect()
        };
        assert_eq!(children(&left), children(&right), "children of node {}", id);
    }
    for arity in Arity::SETS {
        assert_eq!(
            a.get_number_of_node_sets(arity),
            b.get_number_of_node_sets(arity)
        );
        for (left, right) in a.get_node_sets(arity).iter().zip(b.get_node_sets(arity)) {
            let ids = |set: &rmfstore::NodeSetHandle| -> Vec<NodeId> {
                set.get_members()
                    .unwrap()
                    .iter()
                    .map(|node| node.id())
                    .collect()
            };
            assert_eq!(ids(left), ids(&right));
            assert_eq!(left.get_set_type().unwrap(), right.get_set_type().unwrap());
        }
    }
}

fn check_key(a: &FileHandle, a_key: &AnyKey, b: &FileHandle, b_key: &AnyKey) {
    match (a_key, b_key) {
        (AnyKey::Float(x), AnyKey::Float(y)) => compare_values(a, *x, b, *y),
        (AnyKey::Int(x), AnyKey::Int(y)) => compare_values(a, *x, b, *y),
        _ => panic!("key types diverged"),
    }
}

fn compare_values<T: StoredValue>(a: &FileHandle, x: Key<T>, b: &FileHandle, y: Key<T>) {
    assert_eq!(a.get_key_name(x).unwrap(), b.get_key_name(y).unwrap());
    assert_eq!(x.is_per_frame(), y.is_per_frame());
    if x.is_per_frame() {
        assert_eq!(
            a.get_number_of_frames_for(x).unwrap(),
            b.get_number_of_frames_for(y).unwrap()
        );
    }
    for id in 0..a.get_number_of_nodes() {
        let (left, right) = (
            a.get_node_from_id(NodeId(id)).unwrap(),
            b.get_node_from_id(NodeId(id)).unwrap(),
        );
        for frame in 0..=FRAMES {
            assert_eq!(
                left.get_value_always(x, Some(frame)).unwrap(),
                right.get_value_always(y, Some(frame)).unwrap(),
                "node {} frame {}",
                id,
                frame
            );
            assert_eq!(
                left.get_has_value(x, Some(frame)).unwrap(),
                right.get_has_value(y, Some(frame)).unwrap()
            );
        }
    }
}

#[test]
fn test_columnar_and_flat_agree() {
    for seed in [7, 1234, 987_654] {
        let mut replay = Replay::new(
            seed,
            &[Flavour::ColumnarMemory, Flavour::FlatFile, Flavour::FlatBuffer],
        );
        replay.run(400);
        replay.check();
    }
}

#[test]
fn test_sled_agrees_with_buffer() {
    let mut replay = Replay::new(42, &[Flavour::ColumnarSled, Flavour::FlatBuffer]);
    replay.run(250);
    replay.check();
}
