use glam::{Mat4, Vec3, Vec4};
use shadow_scene::core::{Command, Error, RenderContext, RenderState, TraceContext};
use shadow_scene::material::{Material, PassContext};
use shadow_scene::shadow::sources;
use shadow_scene::{Projection, Scene, SceneSize, Shape};

fn size(depth: f32) -> SceneSize {
    SceneSize {
        width: 800,
        height: 600,
        depth,
    }
}

fn project(matrix: Mat4, point: Vec3) -> Vec3 {
    let clip = matrix * point.extend(1.0);
    clip.truncate() / clip.w
}

#[cfg(test)]
mod projection_tests {
    use super::*;

    #[test]
    fn test_orthographic_maps_top_left_corner() {
        let mut ctx = TraceContext::new();
        let mut scene = Scene::new(&mut ctx, size(1000.0)).unwrap();
        scene.projection_mode = Projection::Orthographic;

        let ndc = project(scene.projection(), Vec3::new(0.0, 0.0, -250.0));
        assert!((ndc - Vec3::new(-1.0, 1.0, 0.25)).length() < 1e-5, "got {:?}", ndc);
    }

    #[test]
    fn test_orthographic_maps_bottom_right_corner() {
        let mut ctx = TraceContext::new();
        let mut scene = Scene::new(&mut ctx, size(1000.0)).unwrap();
        scene.projection_mode = Projection::Orthographic;

        let ndc = project(scene.projection(), Vec3::new(800.0, 600.0, 0.0));
        assert!((ndc - Vec3::new(1.0, -1.0, 0.5)).length() < 1e-5, "got {:?}", ndc);
    }

    #[test]
    fn test_orthographic_depth_grows_with_z() {
        let mut ctx = TraceContext::new();
        let mut scene = Scene::new(&mut ctx, size(1000.0)).unwrap();
        scene.projection_mode = Projection::Orthographic;
        let projection = scene.projection();

        let near = project(projection, Vec3::new(0.0, 0.0, -500.0)).z;
        let far = project(projection, Vec3::new(0.0, 0.0, 500.0)).z;
        assert!(near.abs() < 1e-6);
        assert!((far - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_perspective_clip_planes() {
        let mut ctx = TraceContext::new();
        let scene = Scene::new(&mut ctx, size(1000.0)).unwrap();
        let projection = scene.projection();

        let near = project(projection, Vec3::new(0.0, 0.0, -1.0)).z;
        let far = project(projection, Vec3::new(0.0, 0.0, -1000.0)).z;
        assert!(near.abs() < 1e-5, "near plane maps to {}", near);
        assert!((far - 1.0).abs() < 1e-5, "far plane maps to {}", far);
    }

    #[test]
    fn test_perspective_field_of_view_edge() {
        let mut ctx = TraceContext::new();
        let scene = Scene::new(&mut ctx, size(1000.0)).unwrap();

        // 60 degree vertical field of view: the top edge at distance d is d * tan(30)
        let distance = 600.0;
        let top = distance * (scene.field_of_view / 2.0).tan();
        let ndc = project(scene.projection(), Vec3::new(0.0, top, -distance));
        assert!((ndc.y - 1.0).abs() < 1e-4, "got {}", ndc.y);
    }

    #[test]
    fn test_view_projection_composes_projection_and_view() {
        let mut ctx = TraceContext::new();
        let mut scene = Scene::new(&mut ctx, size(1000.0)).unwrap();
        scene.camera_mut().move_to(Vec3::new(-50.0, -50.0, -200.0));
        scene.camera_mut().look_at(Vec3::new(0.0, 0.0, -600.0));

        let expected = scene.projection() * scene.camera().view();
        assert!(scene.view_projection().abs_diff_eq(expected, 1e-6));
    }
}

#[cfg(test)]
mod scene_setup_tests {
    use super::*;

    #[test]
    fn test_depth_must_exceed_near_plane() {
        let mut ctx = TraceContext::new();
        for depth in [1.0, 0.5, -10.0, f32::NAN] {
            let result = Scene::new(&mut ctx, size(depth));
            assert!(matches!(result, Err(Error::InvalidDepthRange { .. })));
        }
        assert!(Scene::new(&mut ctx, size(1.5)).is_ok());
    }

    #[test]
    fn test_new_enables_depth_test_and_culling() {
        let mut ctx = TraceContext::new();
        Scene::new(&mut ctx, size(1000.0)).unwrap();

        assert_eq!(ctx.commands(), &[Command::SetRenderState(RenderState::SCENE)]);
        assert!(ctx.render_state().depth_test);
        assert!(ctx.render_state().cull_back_faces);
    }

    #[test]
    fn test_offscreen_target_matches_surface() {
        let mut ctx = TraceContext::new();
        let scene = Scene::new(&mut ctx, size(1000.0)).unwrap();
        let target = scene.create_offscreen_depth_target(&mut ctx).unwrap();
        assert_eq!((target.width, target.height), (800, 600));
    }
}

#[cfg(test)]
mod scene_draw_tests {
    use super::*;
    use shadow_scene::core::{ProgramDescriptor, ProgramInterface};

    fn scene_with_points(ctx: &mut TraceContext, count: usize) -> Scene {
        let mut scene = Scene::new(ctx, size(1000.0)).unwrap();
        let program = scene
            .compile_program(
                ctx,
                &ProgramDescriptor::new(
                    "point",
                    sources::POINT_VERTEX,
                    sources::POINT_FRAGMENT,
                    ProgramInterface::points(),
                ),
            )
            .unwrap();
        for index in 0..count {
            let mut shape = Shape::points(ctx, program, &[0.0; 3], Material::default()).unwrap();
            shape.move_x(index as f32);
            scene.add(shape);
        }
        ctx.take_commands();
        scene
    }

    #[test]
    fn test_draw_binds_clears_draws_in_order_and_unbinds() {
        let mut ctx = TraceContext::new();
        let mut scene = scene_with_points(&mut ctx, 3);
        scene.clear_color = [0.1, 0.2, 0.3, 1.0];

        scene.draw(&mut ctx, None, &PassContext::depth(Vec3::ZERO)).unwrap();

        let commands = ctx.commands();
        assert_eq!(commands.first(), Some(&Command::BindTarget(None)));
        assert_eq!(commands.get(1), Some(&Command::Clear([0.1, 0.2, 0.3, 1.0])));
        assert_eq!(commands.last(), Some(&Command::UnbindTarget));

        let worlds: Vec<f32> = commands
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform {
                    name,
                    value: shadow_scene::core::UniformValue::Mat4(m),
                    ..
                } if name == "u_world" => Some(m.w_axis.x),
                _ => None,
            })
            .collect();
        assert_eq!(worlds, vec![0.0, 1.0, 2.0]);
        assert_eq!(ctx.draw_count(), 3);
        assert!(ctx.is_unbound());
    }

    #[test]
    fn test_draw_into_offscreen_target() {
        let mut ctx = TraceContext::new();
        let scene = scene_with_points(&mut ctx, 1);
        let target = scene.create_offscreen_depth_target(&mut ctx).unwrap();

        scene
            .draw(&mut ctx, Some(&target), &PassContext::depth(Vec3::ZERO))
            .unwrap();

        let draw_target = ctx.commands().iter().find_map(|c| match c {
            Command::Draw { target, .. } => Some(*target),
            _ => None,
        });
        assert_eq!(draw_target, Some(Some(target.target)));
    }

    #[test]
    fn test_failed_draw_still_unbinds_target() {
        let mut ctx = TraceContext::new();
        let mut scene = Scene::new(&mut ctx, size(1000.0)).unwrap();
        let program = ctx
            .compile_program(&ProgramDescriptor::new(
                "point",
                sources::POINT_VERTEX,
                sources::POINT_FRAGMENT,
                ProgramInterface::points(),
            ))
            .unwrap();
        // Lit materials need u_light, which the point program lacks
        let shape = Shape::points(&mut ctx, program, &[0.0; 3], Material::default().lit()).unwrap();
        scene.add(shape);

        let result = scene.draw(&mut ctx, None, &PassContext::depth(Vec3::ZERO));
        assert!(matches!(result, Err(Error::UniformNotFound { .. })));
        assert!(ctx.is_unbound());
    }

    #[test]
    fn test_view_projection_reaches_shapes() {
        let mut ctx = TraceContext::new();
        let mut scene = scene_with_points(&mut ctx, 1);
        scene.camera_mut().move_to(Vec3::new(0.0, 0.0, 10.0));
        let program = scene.shapes()[0].program();

        scene.draw(&mut ctx, None, &PassContext::depth(Vec3::ZERO)).unwrap();
        let pushed = ctx.uniforms(program).unwrap().view_projection();
        assert!(pushed.abs_diff_eq(scene.view_projection(), 1e-6));
    }
}

#[cfg(test)]
mod light_relation_tests {
    use super::*;
    use shadow_scene::core::{ProgramDescriptor, ProgramInterface};

    fn scene_with_indicator(ctx: &mut TraceContext) -> Scene {
        let mut scene = Scene::new(ctx, size(1000.0)).unwrap();
        let program = scene
            .compile_program(
                ctx,
                &ProgramDescriptor::new(
                    "point",
                    sources::POINT_VERTEX,
                    sources::POINT_FRAGMENT,
                    ProgramInterface::points(),
                ),
            )
            .unwrap();
        let mut shape = Shape::points(
            ctx,
            program,
            &[0.0; 3],
            Material::new(Vec4::new(0.8, 0.0, 1.0, 0.5)),
        )
        .unwrap();
        shape.move_to(Vec3::new(-50.0, -50.0, -200.0));
        let id = scene.add(shape);
        scene.set_light_indicator(id).unwrap();
        scene
    }

    #[test]
    fn test_indicator_defines_light() {
        let mut ctx = TraceContext::new();
        let scene = scene_with_indicator(&mut ctx);
        assert_eq!(scene.light(), Vec3::new(-50.0, -50.0, -200.0));
    }

    #[test]
    fn test_set_light_moves_indicator() {
        let mut ctx = TraceContext::new();
        let mut scene = scene_with_indicator(&mut ctx);
        let id = scene.light_indicator().unwrap();

        scene.set_light(Vec3::new(10.0, 20.0, -300.0));
        assert_eq!(scene.shape(id).unwrap().translation(), Vec3::new(10.0, 20.0, -300.0));

        scene.move_light_y(-75.0);
        assert_eq!(scene.light(), Vec3::new(10.0, -75.0, -300.0));
        assert_eq!(scene.shape(id).unwrap().translation(), scene.light());
    }

    #[test]
    fn test_moving_indicator_moves_light() {
        let mut ctx = TraceContext::new();
        let mut scene = scene_with_indicator(&mut ctx);
        let id = scene.light_indicator().unwrap();

        scene.shape_mut(id).unwrap().move_x(123.0);
        assert_eq!(scene.light().x, 123.0);
    }
}
