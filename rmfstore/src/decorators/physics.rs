// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Physical particles and bonds

use crate::error::RmfResult;
use crate::node::{NodeHandle, NodeSetHandle};

decorator! {
    /// Point particle with per-frame coordinates
    Particle / ParticleConst on NodeHandle {
        factory: ParticleFactory / ParticleConstFactory,
        arity: NODE,
        category: "physics",
        keys: {
            x / set_x: f64 = "cartesian x", true;
            y / set_y: f64 = "cartesian y", true;
            z / set_z: f64 = "cartesian z", true;
            radius / set_radius: f64 = "radius", false;
            mass / set_mass: f64 = "mass", false;
        }
    }
}

impl Particle {
    pub fn coordinates(&self) -> RmfResult<[f64; 3]> {
        Ok([self.x()?, self.y()?, self.z()?])
    }

    pub fn set_coordinates(&self, coordinates: [f64; 3]) -> RmfResult<()> {
        let [x, y, z] = coordinates;
        self.set_x(x)?;
        self.set_y(y)?;
        self.set_z(z)
    }
}

impl ParticleConst {
    pub fn coordinates(&self) -> RmfResult<[f64; 3]> {
        Ok([self.x()?, self.y()?, self.z()?])
    }
}

decorator! {
    /// Rigid body: a particle with an orientation quaternion
    RigidParticle / RigidParticleConst on NodeHandle {
        factory: RigidParticleFactory / RigidParticleConstFactory,
        arity: NODE,
        category: "physics",
        keys: {
            orientation_r / set_orientation_r: f64 = "orientation r", true;
            orientation_i / set_orientation_i: f64 = "orientation i", true;
            orientation_j / set_orientation_j: f64 = "orientation j", true;
            orientation_k / set_orientation_k: f64 = "orientation k", true;
            x / set_x: f64 = "cartesian x", true;
            y / set_y: f64 = "cartesian y", true;
            z / set_z: f64 = "cartesian z", true;
        }
    }
}

impl RigidParticle {
    /// Orientation as `[r, i, j, k]`
    pub fn orientation(&self) -> RmfResult<[f64; 4]> {
        Ok([
            self.orientation_r()?,
            self.orientation_i()?,
            self.orientation_j()?,
            self.orientation_k()?,
        ])
    }

    pub fn set_orientation(&self, orientation: [f64; 4]) -> RmfResult<()> {
        let [r, i, j, k] = orientation;
        self.set_orientation_r(r)?;
        self.set_orientation_i(i)?;
        self.set_orientation_j(j)?;
        self.set_orientation_k(k)
    }
}

impl RigidParticleConst {
    pub fn orientation(&self) -> RmfResult<[f64; 4]> {
        Ok([
            self.orientation_r()?,
            self.orientation_i()?,
            self.orientation_j()?,
            self.orientation_k()?,
        ])
    }
}

decorator! {
    /// Bond between the two members of a pair
    Bond / BondConst on NodeSetHandle {
        factory: BondFactory / BondConstFactory,
        arity: PAIR,
        category: "bond",
        keys: {
            order / set_order: i64 = "bond order", false;
            length / set_length: f64 = "length", true;
        }
    }
}

impl Bond {
    /// The two bonded nodes
    pub fn bonded(&self) -> RmfResult<[NodeHandle; 2]> {
        Ok([self.object().get_member(0)?, self.object().get_member(1)?])
    }
}

impl BondConst {
    pub fn bonded(&self) -> RmfResult<[NodeHandle; 2]> {
        Ok([self.object().get_member(0)?, self.object().get_member(1)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileHandle;
    use crate::node::{NodeType, SetType};

    fn file_with_node() -> (FileHandle, NodeHandle) {
        let file = FileHandle::create_in_buffer().unwrap();
        let node = file
            .get_root_node()
            .add_child("atom", NodeType::Representation)
            .unwrap();
        (file, node)
    }

    #[test]
    fn test_particle_round_trip() {
        let (file, node) = file_with_node();
        let factory = ParticleFactory::new(&file).unwrap();
        assert!(!factory.get_is(&node, Some(0)).unwrap());

        let particle = factory.get(&node, Some(0)).unwrap();
        particle.set_coordinates([1.0, 2.0, 3.0]).unwrap();
        particle.set_radius(0.5).unwrap();
        particle.set_mass(12.0).unwrap();

        assert!(factory.get_is(&node, Some(0)).unwrap());
        assert!(!factory.get_is(&node, Some(1)).unwrap());
        assert_eq!(particle.coordinates().unwrap(), [1.0, 2.0, 3.0]);

        // radius and mass are static, so frame 1 only lacks coordinates
        let later = factory.get(&node, Some(1)).unwrap();
        assert_eq!(later.radius().unwrap(), 0.5);
        assert!(later.x().unwrap_err().is_usage());
    }

    #[test]
    fn test_const_factory_without_keys() {
        let (file, node) = file_with_node();
        let factory = ParticleConstFactory::new(&file).unwrap();
        assert!(!factory.get_is(&node, Some(0)).unwrap());
        assert!(factory.get(&node, Some(0)).unwrap_err().is_usage());
        assert!(file.get_category(crate::keys::Arity::NODE, "physics").unwrap().is_none());
    }

    #[test]
    fn test_rigid_particle_orientation() {
        let (file, node) = file_with_node();
        let rigid = RigidParticleFactory::new(&file)
            .unwrap()
            .get(&node, Some(2))
            .unwrap();
        rigid.set_orientation([1.0, 0.0, 0.0, 0.0]).unwrap();
        rigid.set_x(4.0).unwrap();
        rigid.set_y(5.0).unwrap();
        rigid.set_z(6.0).unwrap();

        let read = RigidParticleConstFactory::new(&file).unwrap();
        assert!(read.get_is(&node, Some(2)).unwrap());
        let view = read.get(&node, Some(2)).unwrap();
        assert_eq!(view.orientation().unwrap(), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(view.z().unwrap(), 6.0);

        // shares the coordinate keys with Particle
        let particles = ParticleFactory::new(&file).unwrap();
        assert_eq!(particles.get(&node, Some(2)).unwrap().x().unwrap(), 4.0);
    }

    #[test]
    fn test_bond_on_pair() {
        let (file, a) = file_with_node();
        let b = file
            .get_root_node()
            .add_child("other", NodeType::Representation)
            .unwrap();
        let pair = file.add_node_set(&[a.clone(), b.clone()], SetType::Bond).unwrap();

        let bonds = BondFactory::new(&file).unwrap();
        let bond = bonds.get(&pair, Some(0)).unwrap();
        bond.set_order(2).unwrap();
        bond.set_length(1.54).unwrap();

        assert!(bonds.get_is(&pair, Some(0)).unwrap());
        assert_eq!(bond.bonded().unwrap(), [a, b]);
        let read = BondConstFactory::new(&file).unwrap().get(&pair, Some(0)).unwrap();
        assert_eq!(read.order().unwrap(), 2);
        assert_eq!(read.length().unwrap(), 1.54);
    }
}
