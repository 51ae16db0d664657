//! Serialized SMPL model arrays.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SmplError};

/// Number of skeleton joints.
pub const JOINT_COUNT: usize = 24;

/// Width of the shape vector (β).
pub const SHAPE_DIM: usize = 10;

/// Width of the axis-angle pose vector (θ): 24 joints × 3.
pub const POSE_DIM: usize = JOINT_COUNT * 3;

/// Width of the pose blend feature: `R_j − I` for joints 1..24, flattened.
pub const POSE_BLEND_DIM: usize = (JOINT_COUNT - 1) * 9;

/// Kinematic tree of the standard SMPL skeleton (`-1` marks the root).
pub const SMPL_PARENTS: [i32; JOINT_COUNT] = [
    -1, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9, 12, 13, 14, 16, 17, 18, 19, 20, 21,
];

/// Raw SMPL model data as stored on disk.
///
/// Arrays are nested in the natural index order:
///
/// | Field | Shape |
/// |-------|-------|
/// | `v_template` | `[V][3]` |
/// | `shapedirs` | `[V][3][10]` |
/// | `posedirs` | `[V][3][207]` |
/// | `j_regressor` | `[24][V]` |
/// | `weights` | `[V][24]` |
/// | `parents` | `[24]` |
/// | `faces` | `[F][3]` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmplData {
    /// Rest-pose template vertices.
    pub v_template: Vec<[f64; 3]>,

    /// Shape blend directions.
    pub shapedirs: Vec<[[f64; SHAPE_DIM]; 3]>,

    /// Pose blend directions.
    pub posedirs: Vec<[Vec<f64>; 3]>,

    /// Joint regressor from vertices.
    pub j_regressor: Vec<Vec<f64>>,

    /// Skinning weights per vertex.
    pub weights: Vec<[f64; JOINT_COUNT]>,

    /// Parent of each joint, `-1` for the root.
    pub parents: Vec<i32>,

    /// Triangle vertex indices.
    #[serde(default)]
    pub faces: Vec<[u32; 3]>,
}

impl SmplData {
    /// Loads model data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed. Dimensions are
    /// checked later by [`SmplData::validate`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let data: Self = serde_json::from_str(&contents)?;
        debug!(
            path = %path.display(),
            vertices = data.v_template.len(),
            faces = data.faces.len(),
            "Loaded body model data"
        );
        Ok(data)
    }

    /// Number of template vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.v_template.len()
    }

    /// Checks every array against the template vertex count.
    ///
    /// # Errors
    ///
    /// Returns [`SmplError::InvalidData`] for a mis-sized array and
    /// [`SmplError::InvalidParent`] if a joint's parent does not precede it.
    pub fn validate(&self) -> Result<()> {
        let v = self.vertex_count();
        if v == 0 {
            return Err(SmplError::invalid_data("v_template", "at least 1 vertex", "0"));
        }

        check_len("shapedirs", self.shapedirs.len(), v)?;
        check_len("posedirs", self.posedirs.len(), v)?;
        check_len("weights", self.weights.len(), v)?;
        check_len("j_regressor", self.j_regressor.len(), JOINT_COUNT)?;
        check_len("parents", self.parents.len(), JOINT_COUNT)?;

        if let Some(row) = self.j_regressor.iter().find(|row| row.len() != v) {
            return Err(SmplError::invalid_data(
                "j_regressor row",
                v.to_string(),
                row.len().to_string(),
            ));
        }
        if let Some(dir) = self
            .posedirs
            .iter()
            .flatten()
            .find(|dir| dir.len() != POSE_BLEND_DIM)
        {
            return Err(SmplError::invalid_data(
                "posedirs row",
                POSE_BLEND_DIM.to_string(),
                dir.len().to_string(),
            ));
        }

        for (joint, &parent) in self.parents.iter().enumerate() {
            let valid = if joint == 0 {
                parent == -1
            } else {
                usize::try_from(parent).is_ok_and(|p| p < joint)
            };
            if !valid {
                return Err(SmplError::InvalidParent { joint, parent });
            }
        }

        if let Some(face) = self
            .faces
            .iter()
            .find(|face| face.iter().any(|&idx| idx as usize >= v))
        {
            return Err(SmplError::invalid_data(
                "faces",
                format!("indices < {v}"),
                format!("{face:?}"),
            ));
        }
        Ok(())
    }
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(SmplError::invalid_data(
            field,
            format!("{expected} rows"),
            format!("{actual} rows"),
        ))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A small rigged model: vertex `v` is fully skinned to joint `v % 24`
    /// and joint `j` sits on vertex `j % V`. Blend directions are zero.
    pub fn rigged(v_template: Vec<[f64; 3]>) -> SmplData {
        let v = v_template.len();
        let mut j_regressor = vec![vec![0.0; v]; JOINT_COUNT];
        for (joint, row) in j_regressor.iter_mut().enumerate() {
            row[joint % v] = 1.0;
        }
        let weights = (0..v)
            .map(|vertex| {
                let mut w = [0.0; JOINT_COUNT];
                w[vertex % JOINT_COUNT] = 1.0;
                w
            })
            .collect();

        SmplData {
            v_template,
            shapedirs: vec![[[0.0; SHAPE_DIM]; 3]; v],
            posedirs: vec![
                [
                    vec![0.0; POSE_BLEND_DIM],
                    vec![0.0; POSE_BLEND_DIM],
                    vec![0.0; POSE_BLEND_DIM],
                ];
                v
            ],
            j_regressor,
            weights,
            parents: SMPL_PARENTS.to_vec(),
            faces: Vec::new(),
        }
    }
}
