use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

lazy_static! {
    /// Known synonym column names across model-authoring conventions,
    /// variant → canonical. All entries are lower-case; lookups compare
    /// case-insensitively on both sides.
    pub static ref COORD_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("hip_flex_r", "hip_flexion_r");
        m.insert("hip_flex_l", "hip_flexion_l");
        m.insert("hip_add_r", "hip_adduction_r");
        m.insert("hip_add_l", "hip_adduction_l");
        m.insert("hip_rot_r", "hip_rotation_r");
        m.insert("hip_rot_l", "hip_rotation_l");
        m.insert("knee_flexion_r", "knee_angle_r");
        m.insert("knee_flexion_l", "knee_angle_l");
        m.insert("ankle_flex_r", "ankle_angle_r");
        m.insert("ankle_flex_l", "ankle_angle_l");
        m.insert("lumbar_ext", "lumbar_extension");
        m.insert("lumbar_bend", "lumbar_bending");
        m.insert("lumbar_rot", "lumbar_rotation");
        m.insert("elbow_flexion_r", "elbow_flex_r");
        m.insert("elbow_flexion_l", "elbow_flex_l");
        m.insert("forearm_rot_r", "pro_sup_r");
        m.insert("forearm_rot_l", "pro_sup_l");
        m
    };

    /// Coordinates that cannot be safely defaulted: the patellar coupling
    /// pair. A model that declares these describes a patellofemoral joint
    /// whose pose is invalid unless the motion data drives it, so a motion
    /// file without them is rejected rather than silently zeroed.
    pub static ref MUST_RESOLVE: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("knee_angle_r_beta");
        s.insert("knee_angle_l_beta");
        s
    };
}
