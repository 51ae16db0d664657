//! SMPL forward pass: blend shapes, kinematic chain and linear blend skinning.

use std::path::Path;

use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::{JOINT_COUNT, POSE_BLEND_DIM, POSE_DIM, SHAPE_DIM, SmplData};
use crate::error::{Result, SmplError};
use crate::rodrigues::rodrigues;

/// Posed body produced by [`SmplModel::forward`].
#[derive(Debug, Clone, PartialEq)]
pub struct SmplOutput {
    /// Posed, translated vertices.
    pub vertices: Vec<Point3<f64>>,
    /// Posed, translated joint positions.
    pub joints: Vec<Point3<f64>>,
    /// Triangle vertex indices (shared with the model).
    pub faces: Vec<[u32; 3]>,
}

/// Validated SMPL body model.
///
/// # Example
///
/// ```no_run
/// use body_smpl::{POSE_DIM, SHAPE_DIM, SmplModel};
///
/// let model = SmplModel::from_file("smpl/female.json")?;
/// let body = model.forward(&[0.0; SHAPE_DIM], &[0.0; POSE_DIM], None, false)?;
/// println!("{} vertices", body.vertices.len());
/// # Ok::<(), body_smpl::SmplError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SmplModel {
    data: SmplData,
    parents: Vec<Option<usize>>,
}

impl SmplModel {
    /// Creates a model from validated data.
    ///
    /// # Errors
    ///
    /// Returns an error if [`SmplData::validate`] fails.
    pub fn new(data: SmplData) -> Result<Self> {
        data.validate()?;
        let parents = data
            .parents
            .iter()
            .map(|&p| usize::try_from(p).ok())
            .collect();

        info!(
            vertices = data.vertex_count(),
            faces = data.faces.len(),
            "Created body model"
        );
        Ok(Self { data, parents })
    }

    /// Loads and validates a model from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the data is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(SmplData::from_file(path)?)
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }

    /// Triangle vertex indices.
    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.data.faces
    }

    /// Underlying model data.
    #[must_use]
    pub const fn data(&self) -> &SmplData {
        &self.data
    }

    /// Poses the body.
    ///
    /// `betas` has [`SHAPE_DIM`] values and `thetas` [`POSE_DIM`] axis-angle
    /// values (joint-major). `trans` defaults to zero. With `simplify` the
    /// pose-dependent blend shapes are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SmplError::InvalidInput`] if an input has the wrong width or
    /// holds a non-finite value.
    pub fn forward(
        &self,
        betas: &[f64],
        thetas: &[f64],
        trans: Option<Vector3<f64>>,
        simplify: bool,
    ) -> Result<SmplOutput> {
        check_input("betas", betas, SHAPE_DIM)?;
        check_input("thetas", thetas, POSE_DIM)?;
        let trans = trans.unwrap_or_else(Vector3::zeros);
        if !trans.iter().all(|v| v.is_finite()) {
            return Err(SmplError::invalid_input("trans", 3, 3));
        }

        let v_shaped = self.shape_blend(betas);
        let rest_joints = self.regress_joints(&v_shaped);

        let rotations: Vec<Matrix3<f64>> = thetas
            .chunks_exact(3)
            .map(|aa| rodrigues(&Vector3::new(aa[0], aa[1], aa[2])))
            .collect();

        let v_posed = if simplify {
            v_shaped
        } else {
            self.pose_blend(v_shaped, &pose_feature(&rotations))
        };

        let world = self.kinematic_chain(&rotations, &rest_joints);
        let joints = world
            .iter()
            .map(|g| Point3::new(g[(0, 3)], g[(1, 3)], g[(2, 3)]) + trans)
            .collect();

        let skinning: Vec<Matrix4<f64>> = world
            .iter()
            .zip(&rest_joints)
            .map(|(g, j)| remove_rest_joint(g, j))
            .collect();

        let vertices = v_posed
            .par_iter()
            .zip(self.data.weights.par_iter())
            .map(|(v, weights)| {
                let blended = weights
                    .iter()
                    .zip(&skinning)
                    .fold(Matrix4::zeros(), |acc, (w, a)| acc + a * *w);
                let h = blended * Vector4::new(v.x, v.y, v.z, 1.0);
                Point3::new(h.x, h.y, h.z) + trans
            })
            .collect();

        debug!(vertices = self.vertex_count(), simplify, "Posed body model");

        Ok(SmplOutput {
            vertices,
            joints,
            faces: self.data.faces.clone(),
        })
    }

    /// Rest-pose joint positions for a shape.
    ///
    /// # Errors
    ///
    /// Returns [`SmplError::InvalidInput`] if `betas` has the wrong width.
    pub fn rest_joints(&self, betas: &[f64]) -> Result<Vec<Point3<f64>>> {
        check_input("betas", betas, SHAPE_DIM)?;
        let v_shaped = self.shape_blend(betas);
        Ok(self
            .regress_joints(&v_shaped)
            .into_iter()
            .map(Point3::from)
            .collect())
    }

    fn shape_blend(&self, betas: &[f64]) -> Vec<Vector3<f64>> {
        self.data
            .v_template
            .par_iter()
            .zip(self.data.shapedirs.par_iter())
            .map(|(t, dirs)| {
                Vector3::new(
                    t[0] + dot(&dirs[0], betas),
                    t[1] + dot(&dirs[1], betas),
                    t[2] + dot(&dirs[2], betas),
                )
            })
            .collect()
    }

    fn regress_joints(&self, v_shaped: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        self.data
            .j_regressor
            .par_iter()
            .map(|row| {
                row.iter()
                    .zip(v_shaped)
                    .fold(Vector3::zeros(), |acc, (w, v)| acc + v * *w)
            })
            .collect()
    }

    fn pose_blend(&self, v_shaped: Vec<Vector3<f64>>, feature: &[f64]) -> Vec<Vector3<f64>> {
        v_shaped
            .into_par_iter()
            .zip(self.data.posedirs.par_iter())
            .map(|(v, dirs)| {
                v + Vector3::new(
                    dot(&dirs[0], feature),
                    dot(&dirs[1], feature),
                    dot(&dirs[2], feature),
                )
            })
            .collect()
    }

    /// World transform of every joint, composed root to leaf.
    fn kinematic_chain(
        &self,
        rotations: &[Matrix3<f64>],
        rest_joints: &[Vector3<f64>],
    ) -> Vec<Matrix4<f64>> {
        let mut world: Vec<Matrix4<f64>> = Vec::with_capacity(JOINT_COUNT);
        for (joint, parent) in self.parents.iter().enumerate() {
            // Parents precede children (checked by validate)
            let transform = match parent.and_then(|p| world.get(p).map(|g| (p, *g))) {
                Some((p, parent_world)) => {
                    parent_world
                        * homogeneous(&rotations[joint], &(rest_joints[joint] - rest_joints[p]))
                }
                None => homogeneous(&rotations[joint], &rest_joints[joint]),
            };
            world.push(transform);
        }
        world
    }
}

fn check_input(name: &'static str, values: &[f64], width: usize) -> Result<()> {
    if values.len() != width || !values.iter().all(|v| v.is_finite()) {
        return Err(SmplError::invalid_input(name, width, values.len()));
    }
    Ok(())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Flattened `R_j − I` for joints 1..24, row-major per joint.
fn pose_feature(rotations: &[Matrix3<f64>]) -> Vec<f64> {
    let mut feature = Vec::with_capacity(POSE_BLEND_DIM);
    for rotation in rotations.iter().skip(1) {
        let offset = rotation - Matrix3::identity();
        for r in 0..3 {
            for c in 0..3 {
                feature.push(offset[(r, c)]);
            }
        }
    }
    feature
}

fn homogeneous(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

/// Re-expresses a joint's world transform relative to its rest position.
fn remove_rest_joint(world: &Matrix4<f64>, rest_joint: &Vector3<f64>) -> Matrix4<f64> {
    let rotated = world.fixed_view::<3, 3>(0, 0) * rest_joint;
    let translation = world.fixed_view::<3, 1>(0, 3) - rotated;
    let mut m = *world;
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
    m
}
