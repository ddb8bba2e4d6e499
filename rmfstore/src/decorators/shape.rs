// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Display geometry
//!
//! Ball, Cylinder and Segment share the "shape" category and are told
//! apart by the internal `type` tag. Cylinder and Segment carry the same
//! tag, so a cylinder also reads as a segment.

use crate::error::RmfResult;
use crate::node::NodeHandle;

decorator! {
    /// Display color
    Colored / ColoredConst on NodeHandle {
        factory: ColoredFactory / ColoredConstFactory,
        arity: NODE,
        category: "shape",
        keys: {
            red / set_red: f64 = "rgb color red", false;
            green / set_green: f64 = "rgb color green", false;
            blue / set_blue: f64 = "rgb color blue", false;
        }
    }
}

impl Colored {
    pub fn rgb_color(&self) -> RmfResult<[f64; 3]> {
        Ok([self.red()?, self.green()?, self.blue()?])
    }

    pub fn set_rgb_color(&self, color: [f64; 3]) -> RmfResult<()> {
        let [red, green, blue] = color;
        self.set_red(red)?;
        self.set_green(green)?;
        self.set_blue(blue)
    }
}

impl ColoredConst {
    pub fn rgb_color(&self) -> RmfResult<[f64; 3]> {
        Ok([self.red()?, self.green()?, self.blue()?])
    }
}

decorator! {
    /// Sphere for display
    Ball / BallConst on NodeHandle {
        factory: BallFactory / BallConstFactory,
        arity: NODE,
        category: "shape",
        tag: "type" = 0,
        keys: {
            x / set_x: f64 = "cartesian x", true;
            y / set_y: f64 = "cartesian y", true;
            z / set_z: f64 = "cartesian z", true;
            radius / set_radius: f64 = "radius", false;
        }
    }
}

impl Ball {
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

impl BallConst {
    pub fn coordinates(&self) -> RmfResult<[f64; 3]> {
        Ok([self.x()?, self.y()?, self.z()?])
    }
}

decorator! {
    /// Poly-line with a radius
    ///
    /// Coordinates are stored by axis: `xs[i], ys[i], zs[i]` is vertex `i`.
    Cylinder / CylinderConst on NodeHandle {
        factory: CylinderFactory / CylinderConstFactory,
        arity: NODE,
        category: "shape",
        tag: "type" = 1,
        keys: {
            xs / set_xs: Vec<f64> = "cartesian xs", true;
            ys / set_ys: Vec<f64> = "cartesian ys", true;
            zs / set_zs: Vec<f64> = "cartesian zs", true;
            radius / set_radius: f64 = "radius", false;
        }
    }
}

decorator! {
    /// Poly-line without thickness
    Segment / SegmentConst on NodeHandle {
        factory: SegmentFactory / SegmentConstFactory,
        arity: NODE,
        category: "shape",
        tag: "type" = 1,
        keys: {
            xs / set_xs: Vec<f64> = "cartesian xs", true;
            ys / set_ys: Vec<f64> = "cartesian ys", true;
            zs / set_zs: Vec<f64> = "cartesian zs", true;
        }
    }
}

/// Vertices of a poly-line stored by axis; axes must have equal lengths
fn vertices(xs: Vec<f64>, ys: Vec<f64>, zs: Vec<f64>) -> RmfResult<Vec<[f64; 3]>> {
    crate::error::usage_check!(
        xs.len() == ys.len() && ys.len() == zs.len(),
        "Coordinate axes differ in length ({}, {}, {})",
        xs.len(),
        ys.len(),
        zs.len()
    );
    Ok(xs
        .into_iter()
        .zip(ys)
        .zip(zs)
        .map(|((x, y), z)| [x, y, z])
        .collect())
}

fn split_vertices(points: &[[f64; 3]]) -> [Vec<f64>; 3] {
    let mut axes = [
        Vec::with_capacity(points.len()),
        Vec::with_capacity(points.len()),
        Vec::with_capacity(points.len()),
    ];
    for point in points {
        for (axis, value) in axes.iter_mut().zip(point) {
            axis.push(*value);
        }
    }
    axes
}

macro_rules! polyline_accessors {
    ($($view:ident),*) => {
        $(
            impl $view {
                pub fn vertices(&self) -> RmfResult<Vec<[f64; 3]>> {
                    vertices(self.xs()?, self.ys()?, self.zs()?)
                }
            }
        )*
    };
}

polyline_accessors!(Cylinder, CylinderConst, Segment, SegmentConst);

impl Cylinder {
    pub fn set_vertices(&self, points: &[[f64; 3]]) -> RmfResult<()> {
        let [xs, ys, zs] = split_vertices(points);
        self.set_xs(xs)?;
        self.set_ys(ys)?;
        self.set_zs(zs)
    }
}

impl Segment {
    pub fn set_vertices(&self, points: &[[f64; 3]]) -> RmfResult<()> {
        let [xs, ys, zs] = split_vertices(points);
        self.set_xs(xs)?;
        self.set_ys(ys)?;
        self.set_zs(zs)
    }
}
