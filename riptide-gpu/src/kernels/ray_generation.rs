use crate::{Camera, Noise, PassParams, Ray, RayInfo};

pub fn main(
    id: u32,
    params: &PassParams,
    camera: &Camera,
    rays: &mut [Ray],
    ray_infos: &mut [RayInfo],
) {
    if id >= params.ray_count {
        return;
    }

    let mut noise = Noise::for_pass(params, id, 0);
    let ray = camera.ray(&mut noise, camera.idx_to_screen(id));

    rays[id as usize] = ray;
    ray_infos[id as usize] = RayInfo::new(id);
}
