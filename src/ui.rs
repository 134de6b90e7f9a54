use std::time::Duration;

use egui_winit::EventResponse;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::core::GpuContext;
use crate::shadow::{Control, ControlTarget, ShadowDemo};

/// Slider value that changed this frame
pub type ControlChange = (ControlTarget, f32);

/// One labelled slider per control. Returns the sliders the user moved.
pub fn control_panel(ui: &mut egui::Ui, controls: &[Control], values: &[f32]) -> Vec<ControlChange> {
    let mut changes = Vec::new();

    for (control, &current) in controls.iter().zip(values) {
        let mut value = current;
        let response = ui.add(
            egui::Slider::new(&mut value, control.min..=control.max).text(control.label),
        );
        if response.changed() {
            changes.push((control.target, value));
        }
    }

    changes
}

/// Delay after which egui wants another frame, if it wants one at all
pub fn repaint_after(output: &egui::FullOutput) -> Option<Duration> {
    output
        .viewport_output
        .get(&egui::ViewportId::ROOT)
        .map(|viewport| viewport.repaint_delay)
        .filter(|delay| *delay != Duration::MAX)
}

/// Destination of egui texture uploads
trait TextureStore {
    fn update(&mut self, id: egui::TextureId, delta: &egui::epaint::ImageDelta);
}

struct RendererTextures<'a> {
    renderer: &'a mut egui_wgpu::Renderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl TextureStore for RendererTextures<'_> {
    fn update(&mut self, id: egui::TextureId, delta: &egui::epaint::ImageDelta) {
        self.renderer.update_texture(self.device, self.queue, id, delta);
    }
}

/// Upload every texture in `delta` and return the ids to free once the frame
/// has been drawn. egui sends each upload once, so this runs for skipped
/// frames too.
fn upload_textures(store: &mut impl TextureStore, delta: egui::TexturesDelta) -> Vec<egui::TextureId> {
    for (id, image_delta) in &delta.set {
        store.update(*id, image_delta);
    }
    delta.free
}

/// egui state for the slider window drawn over the scene
pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Overlay {
    pub fn new(window: &Window, gpu: &GpuContext) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            gpu.device(),
            gpu.surface_format(),
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            ctx,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> EventResponse {
        self.state.on_window_event(window, event)
    }

    /// Lay out the control window for `demo`
    pub fn run(&mut self, window: &Window, demo: &ShadowDemo) -> (egui::FullOutput, Vec<ControlChange>) {
        let controls = demo.controls();
        let values: Vec<f32> = controls.iter().map(|c| demo.value(c.target)).collect();
        let mut changes = Vec::new();

        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, |ctx| {
            egui::Window::new("Controls")
                .resizable(false)
                .default_pos(egui::pos2(10.0, 10.0))
                .show(ctx, |ui| {
                    changes = control_panel(ui, &controls, &values);
                });
        });

        (full_output, changes)
    }

    /// Draw `output` on top of the frame the scene was rendered into. Without
    /// a frame only the texture updates are applied.
    pub fn paint(&mut self, window: &Window, gpu: &GpuContext, output: egui::FullOutput) {
        self.state
            .handle_platform_output(window, output.platform_output);

        let (device, queue) = (gpu.device(), gpu.queue());
        let freed = upload_textures(
            &mut RendererTextures {
                renderer: &mut self.renderer,
                device,
                queue,
            },
            output.textures_delta,
        );

        if let Some(view) = gpu.frame_view() {
            let tris = self
                .ctx
                .tessellate(output.shapes, self.ctx.pixels_per_point());
            self.render(window, gpu, view, &tris);
        }

        for id in &freed {
            self.renderer.free_texture(id);
        }
    }

    fn render(
        &mut self,
        window: &Window,
        gpu: &GpuContext,
        view: &wgpu::TextureView,
        tris: &[egui::ClippedPrimitive],
    ) {
        let (device, queue) = (gpu.device(), gpu.queue());
        let (width, height) = gpu.surface_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui Encoder"),
        });
        self.renderer
            .update_buffers(device, queue, &mut encoder, tris, &screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            self.renderer
                .render(&mut render_pass, tris, &screen_descriptor);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}
