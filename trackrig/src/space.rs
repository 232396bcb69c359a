use {crate::scene::Transforms, nalgebra as na};

/// Mapping from tracking source coordinates into the consumer's world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkingSpace<H> {
    handle: H,
    external: bool,
    pivot: na::Vector3<f32>,
}

impl<H> WorkingSpace<H>
where
    H: Copy + Eq,
{
    /// Uses `reference` if the source designates one,
    /// rig's own `origin` otherwise.
    pub fn new(origin: H, reference: Option<H>) -> Self {
        match reference {
            Some(handle) => WorkingSpace {
                handle,
                external: true,
                pivot: na::Vector3::zeros(),
            },
            None => WorkingSpace {
                handle: origin,
                external: false,
                pivot: na::Vector3::zeros(),
            },
        }
    }

    pub fn handle(&self) -> H {
        self.handle
    }

    pub fn pivot(&self) -> na::Vector3<f32> {
        self.pivot
    }

    pub fn rotation<T>(&self, transforms: &T) -> na::UnitQuaternion<f32>
    where
        T: Transforms<Handle = H>,
    {
        transforms.world_rotation(self.handle)
    }

    /// Fixed correction applied before the space transform.
    /// Without external reference the source is turned around
    /// to keep the subject facing the sensor.
    pub fn correction(&self) -> na::UnitQuaternion<f32> {
        if self.external {
            na::UnitQuaternion::identity()
        } else {
            na::UnitQuaternion::from_axis_angle(
                &na::Vector3::y_axis(),
                std::f32::consts::PI,
            )
        }
    }

    pub fn to_world<T>(
        &self,
        transforms: &T,
        source: &na::Point3<f32>,
    ) -> na::Point3<f32>
    where
        T: Transforms<Handle = H>,
    {
        let local = self.correction() * (source - self.pivot);
        transforms.transform_point(self.handle, &local)
    }

    /// Accumulates pivot offset after recalibration.
    /// Side-to-side component is always dropped.
    pub fn recenter(
        &mut self,
        initial_root: na::Point3<f32>,
        current_root: na::Point3<f32>,
    ) {
        let mut pivot = (initial_root - current_root) + self.pivot;
        pivot.x = 0.0;
        self.pivot = pivot;
    }
}
