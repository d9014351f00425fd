//! Synthetic analysis requests for load tests and fixtures.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::analysis::request::{Base, NopRequest, NpmRequest, PackageRequest, PypiRequest, Request};
use crate::analysis::types::Type;
use crate::error::TypeError;
use crate::models::Ecosystem;

const NPM_PACKAGES: &[&str] = &["chalk", "lodash", "express", "react", "@types/node", "left-pad", "debug"];
const PYPI_PACKAGES: &[&str] = &["requests", "numpy", "flask", "django", "urllib3", "boto3"];

/// Upper bound on remembered requests.
const POOL_CAPACITY: usize = 64;

/// Random request generator with a small reuse pool.
///
/// Reused requests are clones of earlier ones with a fresh snowflake, so
/// every generated request has a distinct id.
pub struct Generator {
    rng: StdRng,
    types: Vec<Type>,
    pool: Vec<Request>,
    reuse: f64,
    counter: u64,
}

impl Generator {
    /// Generator over every registered type.
    pub fn new(seed: u64) -> Self {
        Self::with_types(seed, Type::ALL.to_vec())
    }

    pub fn with_types(seed: u64, types: Vec<Type>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            types,
            pool: Vec::new(),
            reuse: 0.0,
            counter: 0,
        }
    }

    /// Probability (clamped to `0..=1`) of handing out a pooled request.
    pub fn with_reuse(mut self, probability: f64) -> Self {
        self.reuse = probability.clamp(0.0, 1.0);
        self
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Produce one valid request.
    pub fn next_request(&mut self) -> Result<Request, TypeError> {
        let id = self.next_id();

        if !self.pool.is_empty() && self.rng.gen_bool(self.reuse) {
            let index = self.rng.gen_range(0..self.pool.len());
            return Ok(self.pool[index].clone().with_id(id));
        }

        let kind = *self
            .types
            .choose(&mut self.rng)
            .ok_or_else(|| TypeError::NotFound("generator has no types".to_string()))?;

        let mut base = Base::new(kind, id);
        base.priority = self.rng.gen_range(0..=3);
        base.force = self.rng.gen_bool(0.1);

        let request = match kind.ecosystem()? {
            None => Request::Nop(NopRequest { base }),
            Some(ecosystem) => {
                let package = self.package(base, ecosystem);
                match ecosystem {
                    Ecosystem::Npm => Request::Npm(NpmRequest(package)),
                    Ecosystem::Pypi => Request::Pypi(PypiRequest(package)),
                }
            }
        };

        if self.pool.len() == POOL_CAPACITY {
            let evict = self.rng.gen_range(0..POOL_CAPACITY);
            self.pool.swap_remove(evict);
        }
        self.pool.push(request.clone());
        Ok(request)
    }

    fn package(&mut self, base: Base, ecosystem: Ecosystem) -> PackageRequest {
        let names = match ecosystem {
            Ecosystem::Npm => NPM_PACKAGES,
            Ecosystem::Pypi => PYPI_PACKAGES,
        };
        let name = names.choose(&mut self.rng).copied().unwrap_or("left-pad");
        let version = format!(
            "{}.{}.{}",
            self.rng.gen_range(0..10),
            self.rng.gen_range(0..30),
            self.rng.gen_range(0..20)
        );
        let shasum_bytes: [u8; 20] = self.rng.gen();
        PackageRequest {
            base,
            name: name.to_string(),
            version: Some(version),
            shasum: Some(hex::encode(shasum_bytes)),
        }
    }

    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{:016x}{:08x}", self.rng.gen::<u64>(), self.counter)
    }
}

impl Iterator for Generator {
    type Item = Result<Request, TypeError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_request())
    }
}
