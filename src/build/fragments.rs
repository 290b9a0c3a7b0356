//! Configuration fragment composition.
//!
//! The native build merges fragments left to right, later ones overriding
//! earlier ones, so the order produced here is significant:
//!
//! ```text
//! vendor/<target>_defconfig   device base
//! vendor/grass.config         common
//! vendor/<target>.config      device overrides
//! vendor/ksu.config           root support (optional)
//! vendor/aosp.config          AOSP variant (optional)
//! ```

use crate::request::{BuildRequest, Variant};

/// Directory (relative to `arch/<arch>/configs`) holding every fragment.
pub const FRAGMENT_NAMESPACE: &str = "vendor";

pub const COMMON_FRAGMENT: &str = "grass.config";
pub const ROOT_SUPPORT_FRAGMENT: &str = "ksu.config";
pub const AOSP_FRAGMENT: &str = "aosp.config";

/// Ordered fragment names passed to the configuration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFragmentList(Vec<String>);

impl ConfigFragmentList {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Build the fragment list for a validated request.
pub fn compose(request: &BuildRequest) -> ConfigFragmentList {
    let target = request.target.as_str();
    let mut fragments = vec![
        format!("{}_defconfig", target),
        COMMON_FRAGMENT.to_string(),
        format!("{}.config", target),
    ];
    if request.include_root_support {
        fragments.push(ROOT_SUPPORT_FRAGMENT.to_string());
    }
    if request.variant == Variant::Aosp {
        fragments.push(AOSP_FRAGMENT.to_string());
    }

    ConfigFragmentList(
        fragments
            .into_iter()
            .map(|f| format!("{}/{}", FRAGMENT_NAMESPACE, f))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Target;

    fn request(target: Target, variant: Variant, ksu: bool) -> BuildRequest {
        BuildRequest {
            target,
            variant,
            include_root_support: ksu,
            allow_dirty_output: false,
        }
    }

    #[test]
    fn test_a51_aosp_with_ksu() {
        let list = compose(&request(Target::A51, Variant::Aosp, true));
        assert_eq!(
            list.as_slice(),
            [
                "vendor/a51_defconfig",
                "vendor/grass.config",
                "vendor/a51.config",
                "vendor/ksu.config",
                "vendor/aosp.config",
            ]
        );
    }

    #[test]
    fn test_oneui_without_ksu_is_baseline() {
        let list = compose(&request(Target::M31s, Variant::OneUi, false));
        assert_eq!(
            list.as_slice(),
            [
                "vendor/m31s_defconfig",
                "vendor/grass.config",
                "vendor/m31s.config",
            ]
        );
    }

    #[test]
    fn test_length_and_order_for_every_combination() {
        for target in Target::ALL {
            for variant in [Variant::OneUi, Variant::Aosp] {
                for ksu in [true, false] {
                    let list = compose(&request(target, variant, ksu));
                    let expected_len =
                        3 + usize::from(ksu) + usize::from(variant == Variant::Aosp);
                    assert_eq!(list.len(), expected_len);

                    let items: Vec<&str> = list.iter().collect();
                    assert_eq!(items[0], format!("vendor/{}_defconfig", target));
                    assert_eq!(items[1], "vendor/grass.config");
                    assert_eq!(items[2], format!("vendor/{}.config", target));
                    let mut rest = items[3..].iter();
                    if ksu {
                        assert_eq!(rest.next(), Some(&"vendor/ksu.config"));
                    }
                    if variant == Variant::Aosp {
                        assert_eq!(rest.next(), Some(&"vendor/aosp.config"));
                    }
                    assert_eq!(rest.next(), None);
                }
            }
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let req = request(Target::M21, Variant::Aosp, true);
        assert_eq!(compose(&req), compose(&req));
    }
}
