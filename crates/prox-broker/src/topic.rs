//! Topic names, one newtype per family.

use std::fmt;

macro_rules! topic {
    ($(#[$attr:meta])* $name:ident, $default:literal) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl Default for $name {
            fn default() -> Self {
                Self($default.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_string())
            }
        }
    };
}

topic!(
    /// Topic carrying [`BodyPresentationMessage`](crate::BodyPresentationMessage)s.
    BodyPresentationTopic,
    "opera_body_presentation"
);
topic!(
    /// Topic carrying [`HumanStateMessage`](crate::HumanStateMessage)s.
    HumanStateTopic,
    "opera_human_state"
);
topic!(
    /// Topic carrying [`RobotStateMessage`](crate::RobotStateMessage)s.
    RobotStateTopic,
    "opera_robot_state"
);
topic!(
    /// Topic carrying [`CollisionNotificationMessage`](crate::CollisionNotificationMessage)s.
    CollisionNotificationTopic,
    "opera_collision_notification"
);
