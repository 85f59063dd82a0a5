//! Skeletal animation
//!
//! A [`Skeleton`] holds joint rest poses and inverse bind matrices; an
//! [`AnimationClip`] holds keyframe tracks per joint. Sampling a clip
//! produces the skinning matrices uploaded alongside skinned meshes, at most
//! [`MAX_BONES`] of them.

use lumen_math::{mat4, Mat4, Quat, Vec3};

use crate::transform::Transform;

/// Upper bound on skinning matrices per object
pub const MAX_BONES: usize = 64;

/// One bone of a skeleton
#[derive(Clone, Debug)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint, `None` for roots
    pub parent: Option<usize>,
    /// Local transform when no animation drives the joint
    pub rest: Transform,
    /// Maps mesh space into this joint's space
    pub inverse_bind: Mat4,
}

/// Joint hierarchy of a skinned model
#[derive(Clone, Debug)]
pub struct Skeleton {
    joints: Vec<Joint>,
    root: Mat4,
}

impl Skeleton {
    /// Build a skeleton
    ///
    /// `root` is applied above every root joint. Joints past [`MAX_BONES`]
    /// are dropped, and parent links that are out of range or cyclic are
    /// cut.
    pub fn new(mut joints: Vec<Joint>, root: Mat4) -> Self {
        if joints.len() > MAX_BONES {
            log::warn!("Skeleton has {} joints, keeping the first {}", joints.len(), MAX_BONES);
            joints.truncate(MAX_BONES);
        }
        let n = joints.len();
        for i in 0..n {
            if !has_valid_ancestry(&joints, i) {
                log::warn!("Joint '{}' has a broken parent link", joints[i].name);
                joints[i].parent = None;
            }
        }
        Self { joints, root }
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Skinning matrices for the bind pose (identity for a clean rig)
    pub fn rest_pose(&self) -> Vec<Mat4> {
        self.pose(None, 0.0)
    }

    /// Skinning matrices with `clip` sampled at `time` seconds
    ///
    /// Joints the clip doesn't animate stay at their rest transform.
    pub fn pose(&self, clip: Option<&AnimationClip>, time: f32) -> Vec<Mat4> {
        let locals: Vec<Mat4> = self
            .joints
            .iter()
            .enumerate()
            .map(|(i, joint)| {
                let mut local = joint.rest;
                if let Some(track) = clip.and_then(|c| c.track(i)) {
                    track.apply(time, &mut local);
                }
                local.matrix()
            })
            .collect();

        let mut globals = vec![None; self.joints.len()];
        (0..self.joints.len())
            .map(|i| {
                let global = self.global(i, &locals, &mut globals);
                mat4::mul(global, self.joints[i].inverse_bind)
            })
            .collect()
    }

    fn global(&self, i: usize, locals: &[Mat4], globals: &mut [Option<Mat4>]) -> Mat4 {
        if let Some(m) = globals[i] {
            return m;
        }
        let parent = match self.joints[i].parent {
            Some(p) => self.global(p, locals, globals),
            None => self.root,
        };
        let m = mat4::mul(parent, locals[i]);
        globals[i] = Some(m);
        m
    }
}

fn has_valid_ancestry(joints: &[Joint], start: usize) -> bool {
    let mut current = start;
    for _ in 0..joints.len() {
        match joints[current].parent {
            None => return true,
            Some(p) if p >= joints.len() => return false,
            Some(p) => current = p,
        }
    }
    false
}

/// How values between keyframes are produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

/// Keyframes for one property
#[derive(Clone, Debug, Default)]
pub struct Keyframes<T> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: Interpolation,
}

impl<T: Copy> Keyframes<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: Interpolation) -> Self {
        let len = times.len().min(values.len());
        let (mut times, mut values) = (times, values);
        times.truncate(len);
        values.truncate(len);
        Self {
            times,
            values,
            interpolation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Last keyframe time
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Value at `time`, clamped to the first and last keys
    pub fn sample(&self, time: f32, blend: impl Fn(T, T, f32) -> T) -> Option<T> {
        let first = *self.values.first()?;
        if time <= self.times[0] {
            return Some(first);
        }
        // Index of the first key strictly after `time`
        let next = self.times.partition_point(|&t| t <= time);
        if next >= self.times.len() {
            return self.values.last().copied();
        }
        let prev = next - 1;
        if self.interpolation == Interpolation::Step {
            return Some(self.values[prev]);
        }
        let span = self.times[next] - self.times[prev];
        let t = if span > 0.0 { (time - self.times[prev]) / span } else { 0.0 };
        Some(blend(self.values[prev], self.values[next], t))
    }
}

/// All animated properties of one joint
#[derive(Clone, Debug, Default)]
pub struct JointTrack {
    pub translations: Keyframes<Vec3>,
    pub rotations: Keyframes<Quat>,
    pub scales: Keyframes<Vec3>,
}

impl JointTrack {
    /// Overwrite the animated properties of `local`
    pub fn apply(&self, time: f32, local: &mut Transform) {
        if let Some(p) = self.translations.sample(time, Vec3::lerp) {
            local.position = p;
        }
        if let Some(r) = self.rotations.sample(time, Quat::slerp) {
            local.rotation = r.normalized();
        }
        if let Some(s) = self.scales.sample(time, Vec3::lerp) {
            local.scale = s;
        }
    }

    fn end_time(&self) -> f32 {
        self.translations
            .end_time()
            .max(self.rotations.end_time())
            .max(self.scales.end_time())
    }
}

/// A named animation over a skeleton
#[derive(Clone, Debug)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    tracks: Vec<Option<JointTrack>>,
}

impl AnimationClip {
    /// Build a clip from `(joint index, track)` pairs
    ///
    /// Duration is the latest keyframe time across all tracks.
    pub fn new(name: impl Into<String>, tracks: impl IntoIterator<Item = (usize, JointTrack)>) -> Self {
        let mut by_joint: Vec<Option<JointTrack>> = Vec::new();
        let mut duration = 0.0f32;
        for (joint, track) in tracks {
            if joint >= MAX_BONES {
                continue;
            }
            if by_joint.len() <= joint {
                by_joint.resize(joint + 1, None);
            }
            duration = duration.max(track.end_time());
            by_joint[joint] = Some(track);
        }
        Self {
            name: name.into(),
            duration,
            tracks: by_joint,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn track(&self, joint: usize) -> Option<&JointTrack> {
        self.tracks.get(joint).and_then(Option::as_ref)
    }
}

/// Playback cursor for the clip an object is running
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub clip: String,
    /// Seconds into the clip
    pub time: f32,
    pub looping: bool,
    /// Playback rate multiplier
    pub speed: f32,
    finished: bool,
}

impl AnimationState {
    pub fn new(clip: impl Into<String>, looping: bool) -> Self {
        Self {
            clip: clip.into(),
            time: 0.0,
            looping,
            speed: 1.0,
            finished: false,
        }
    }

    /// True once a non-looping clip has reached its end
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Move the cursor forward by `dt` seconds of a clip `duration` long
    ///
    /// Looping clips wrap; others hold on the last frame.
    pub fn advance(&mut self, dt: f32, duration: f32) {
        if self.finished {
            return;
        }
        self.time += dt * self.speed;
        if duration <= 0.0 {
            self.time = 0.0;
            self.finished = !self.looping;
            return;
        }
        if self.time >= duration || self.time < 0.0 {
            if self.looping {
                self.time = self.time.rem_euclid(duration);
            } else {
                self.time = self.time.clamp(0.0, duration);
                self.finished = true;
            }
        }
    }
}
