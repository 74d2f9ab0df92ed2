//! 关节路点序列
//!
//! 内置一条预先录制的八点关节巡回序列，也可以从 JSON 文件加载：
//!
//! ```json
//! {
//!   "name": "pick-demo",
//!   "description": "two poses",
//!   "waypoints": [
//!     { "angles": [27.0, 33.0, -138.0, 1.5, 6.5, -2.0] },
//!     { "angles": [126.0, 73.0, -140.0, 6.0, -15.0, -10.0], "radius": -42.0 }
//!   ]
//! }
//! ```
//!
//! 省略 `radius` 时使用精确停止（-1）。

use armgate_controller::{BlendRadius, JointAngles};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SupervisorError};

/// 单个路点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// 目标关节角（度）
    pub angles: JointAngles,
    /// 过渡半径
    #[serde(default)]
    pub radius: BlendRadius,
}

impl Waypoint {
    /// 精确停在目标点的路点
    pub const fn exact(angles: [f64; 6]) -> Self {
        Self {
            angles: JointAngles::new(angles),
            radius: BlendRadius::EXACT_STOP,
        }
    }

    pub const fn with_radius(angles: [f64; 6], radius: f64) -> Self {
        Self {
            angles: JointAngles::new(angles),
            radius: BlendRadius(radius),
        }
    }
}

/// 有序路点序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSequence {
    /// 序列名称
    pub name: String,

    /// 序列描述
    #[serde(default)]
    pub description: String,

    /// 路点（按执行顺序）
    pub waypoints: Vec<Waypoint>,
}

/// 往返于收拢位的姿态
const HOME: [f64; 6] = [27.0, -75.0, 5.0, 2.0, -36.0, -2.0];

impl MotionSequence {
    pub fn new(name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            waypoints,
        }
    }

    /// 内置的八点录制序列
    ///
    /// 第 5 个路点使用 -42 的过渡参数，其余均为精确停止。
    pub fn recorded() -> Self {
        Self {
            name: "recorded-joint-tour".to_string(),
            description: "Eight recorded joint poses, returning to the tuck pose between reaches"
                .to_string(),
            waypoints: vec![
                Waypoint::exact([27.0, 33.0, -138.0, 1.5, 6.5, -2.0]),
                Waypoint::exact(HOME),
                Waypoint::exact([28.0, -41.0, -150.0, 10.0, 0.0, -10.0]),
                Waypoint::exact(HOME),
                Waypoint::with_radius([126.0, 73.0, -140.0, 6.0, -15.0, -10.0], -42.0),
                Waypoint::exact(HOME),
                Waypoint::exact([91.0, 27.0, -141.0, 6.0, -15.0, -43.0]),
                Waypoint::exact(HOME),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.waypoints.iter()
    }

    /// 序列非空，且所有角度和过渡参数都是有限值
    pub fn validate(&self) -> Result<()> {
        if self.waypoints.is_empty() {
            return Err(SupervisorError::InvalidSequence(format!(
                "sequence `{}` has no waypoints",
                self.name
            )));
        }
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            if !waypoint.angles.is_finite() || !waypoint.radius.0.is_finite() {
                return Err(SupervisorError::InvalidSequence(format!(
                    "waypoint {} of `{}` has non-finite values: {} r={}",
                    i + 1,
                    self.name,
                    waypoint.angles,
                    waypoint.radius.0
                )));
            }
        }
        Ok(())
    }

    /// 从 JSON 字符串解析并校验
    pub fn from_json_str(content: &str) -> Result<Self> {
        let sequence: MotionSequence = serde_json::from_str(content)?;
        sequence.validate()?;
        Ok(sequence)
    }

    /// 加载序列文件
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 保存序列文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a MotionSequence {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_sequence_shape() {
        let sequence = MotionSequence::recorded();
        assert_eq!(sequence.len(), 8);
        assert!(sequence.validate().is_ok());

        let radii: Vec<f64> = sequence.iter().map(|w| w.radius.0).collect();
        assert_eq!(radii, vec![-1.0, -1.0, -1.0, -1.0, -42.0, -1.0, -1.0, -1.0]);

        // 偶数步都回到收拢位
        for i in [1, 3, 5, 7] {
            assert_eq!(sequence.waypoints[i].angles.as_array(), &HOME);
        }
        assert_eq!(
            sequence.waypoints[6].angles.as_array(),
            &[91.0, 27.0, -141.0, 6.0, -15.0, -43.0]
        );
    }

    #[test]
    fn test_json_radius_defaults_to_exact_stop() {
        let sequence = MotionSequence::from_json_str(
            r#"{
                "name": "two",
                "waypoints": [
                    { "angles": [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] },
                    { "angles": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0], "radius": 15.0 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(sequence.description, "");
        assert_eq!(sequence.waypoints[0].radius, BlendRadius::EXACT_STOP);
        assert!(sequence.waypoints[1].radius.is_blending());
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let result = MotionSequence::from_json_str(r#"{ "name": "empty", "waypoints": [] }"#);
        assert!(matches!(result, Err(SupervisorError::InvalidSequence(_))));
    }

    #[test]
    fn test_wrong_joint_count_rejected() {
        let result = MotionSequence::from_json_str(
            r#"{ "name": "short", "waypoints": [ { "angles": [1.0, 2.0] } ] }"#,
        );
        assert!(matches!(result, Err(SupervisorError::SequenceFormat(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.json");

        let sequence = MotionSequence::recorded();
        sequence.save(&path).unwrap();
        let loaded = MotionSequence::load(&path).unwrap();
        assert_eq!(loaded, sequence);
    }
}
