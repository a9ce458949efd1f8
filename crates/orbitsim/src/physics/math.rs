/// Scalar type for physics calculations (f64 for precision)
pub type Scalar = f64;

/// 3D vector type for positions, velocities, and accelerations
pub type Vector = bevy::math::DVec3;

/// Gravitational constant in code units
pub const G: Scalar = 1.0;

pub const PI: Scalar = std::f64::consts::PI;

pub const DEG_TO_RAD: Scalar = PI / 180.0;

/// Angle of the position vector in the x-y plane, in radians
pub fn polar_angle(position: Vector) -> Scalar {
    libm::atan2(position.y, position.x)
}

/// Fractional drift `|(initial - current) / initial|`, zero when there is no baseline
pub fn relative_error(initial: Scalar, current: Scalar) -> Scalar {
    if initial == 0.0 {
        0.0
    } else {
        ((initial - current) / initial).abs()
    }
}

/// Unit direction for an initial velocity, falling back to +y for a zero vector
pub fn unit_direction(direction: Vector) -> Vector {
    direction.try_normalize().unwrap_or(Vector::Y)
}
