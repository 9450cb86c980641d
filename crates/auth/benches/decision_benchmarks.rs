use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use scholaris_auth::defaults::{PARENT, SCHOOL_ADMIN, STUDENT, SUPER_ADMIN, TEACHER};
use scholaris_auth::{
    AccessGuard, Actor, AdminAction, ResourceScope, RoleId, TargetAccount, TaxonomyConfig,
    TaxonomyGenerator,
};
use scholaris_core::{ActorId, OrganizationId};
use std::sync::Arc;

fn guard() -> AccessGuard {
    let registry = TaxonomyGenerator::generate(&TaxonomyConfig::school_defaults())
        .unwrap()
        .into_registry();
    AccessGuard::new(Arc::new(registry)).unwrap()
}

fn bench_has_permission(c: &mut Criterion) {
    let guard = guard();
    let org = OrganizationId::from_u128(5);
    let mut group = c.benchmark_group("has_permission");

    for role in [SUPER_ADMIN, SCHOOL_ADMIN, TEACHER, STUDENT] {
        let actor = Actor::new(ActorId::from_u128(1), RoleId::new(role)).in_organization(org);
        group.bench_with_input(BenchmarkId::from_parameter(role), &actor, |b, actor| {
            b.iter(|| {
                guard
                    .engine()
                    .has_permission(black_box(actor), black_box("attendance.mark"))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_instance_check(c: &mut Criterion) {
    let guard = guard();
    let child = ActorId::from_u128(30);
    let parent = Actor::new(ActorId::from_u128(20), RoleId::new(PARENT))
        .in_organization(OrganizationId::from_u128(1))
        .with_relationship_subjects([child]);
    let record = ResourceScope::in_organization(OrganizationId::from_u128(5)).about(child);

    c.bench_function("check/guardian_relationship", |b| {
        b.iter(|| guard.check(black_box(&parent), "grade.view", black_box(&record)))
    });
}

fn bench_admin_policy(c: &mut Criterion) {
    let guard = guard();
    let admin = Actor::new(ActorId::from_u128(2), RoleId::new(SCHOOL_ADMIN))
        .in_organization(OrganizationId::from_u128(5));
    let student = TargetAccount::new(
        Actor::new(ActorId::from_u128(3), RoleId::new(STUDENT)).in_organization(OrganizationId::from_u128(5)),
    );

    c.bench_function("policy/reset_password", |b| {
        b.iter(|| {
            guard
                .policy()
                .evaluate(black_box(&admin), black_box(&student), AdminAction::ResetPassword)
                .unwrap()
        })
    });
}

fn bench_capability_matrix(c: &mut Criterion) {
    let guard = guard();
    let teacher = Actor::new(ActorId::from_u128(4), RoleId::new(TEACHER));

    c.bench_function("capabilities_for/teacher", |b| {
        b.iter(|| guard.engine().capabilities_for(black_box(&teacher)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_has_permission,
    bench_instance_check,
    bench_admin_policy,
    bench_capability_matrix
);
criterion_main!(benches);
