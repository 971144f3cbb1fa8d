use crate::{lower_bound, upper_bound, PassParams, RayRef};

/// One step of a bottom-up merge sort: merges pairs of adjacent sorted runs
/// of length `section_length` from `src` into `dst`.
///
/// Every lane computes its destination independently, by binary-searching
/// the opposite run of its section. Ties are resolved so that elements of
/// the left run precede equal elements of the right run.
pub fn main(id: u32, params: &PassParams, src: &[RayRef], dst: &mut [RayRef]) {
    let len = params.ray_count;

    if id >= len {
        return;
    }

    let section_length = params.section_length;
    let section_start = (id / (2 * section_length)) * (2 * section_length);
    let mid = (section_start + section_length).min(len);
    let section_end = (section_start + 2 * section_length).min(len);

    let left = &src[section_start as usize..mid as usize];
    let right = &src[mid as usize..section_end as usize];
    let item = src[id as usize];

    let target = if id < mid {
        let i = (id - section_start) as usize;

        section_start as usize + i + lower_bound(right, item.bucket)
    } else {
        let j = (id - mid) as usize;

        section_start as usize + j + upper_bound(left, item.bucket)
    };

    dst[target] = item;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort(buckets: &[u32]) -> Vec<RayRef> {
        let len = buckets.len() as u32;

        let mut src: Vec<_> = buckets
            .iter()
            .enumerate()
            .map(|(index, &bucket)| RayRef {
                bucket,
                index: index as u32,
            })
            .collect();

        let mut dst = vec![RayRef::default(); src.len()];
        let mut section_length = 1;

        while section_length < len {
            let params = PassParams {
                ray_count: len,
                section_length,
                ..Default::default()
            };

            for id in 0..len {
                main(id, &params, &src, &mut dst);
            }

            std::mem::swap(&mut src, &mut dst);
            section_length *= 2;
        }

        src
    }

    #[test]
    fn sorts_by_bucket() {
        let actual = sort(&[3, 1, 2, 1, 0, 3, 2]);
        let buckets: Vec<_> = actual.iter().map(|r| r.bucket).collect();

        assert_eq!(vec![0, 1, 1, 2, 2, 3, 3], buckets);

        // Stable, as a by-product of the tie-breaking rule
        let indices: Vec<_> = actual.iter().map(|r| r.index).collect();

        assert_eq!(vec![4, 1, 3, 2, 6, 0, 5], indices);
    }

    #[test]
    fn single_element() {
        assert_eq!(vec![RayRef { bucket: 5, index: 0 }], sort(&[5]));
    }
}
