//! HTML shell of the ROI tool: map, analysis and comparison screens.

use serde::Serialize;

use crate::analysis::{
    DEFAULT_ANALYSIS_END, DEFAULT_ANALYSIS_START, DEFAULT_PERIOD_1, DEFAULT_PERIOD_2,
    MAX_COMPARED_VARIABLES,
};
use crate::variables::Variable;

/// Initial map view, `[lat, lon]` and zoom.
pub const MAP_CENTER: [f64; 2] = [33.0, 19.0];
pub const MAP_ZOOM: u8 = 5;

#[derive(Debug, Serialize)]
struct VariableEntry {
    name: &'static str,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct PageConfig {
    variables: Vec<VariableEntry>,
    center: [f64; 2],
    zoom: u8,
    analysis: [&'static str; 2],
    period1: [&'static str; 2],
    period2: [&'static str; 2],
    max_compared: usize,
    platform: String,
}

pub fn index_page(platform: &str) -> String {
    let config = PageConfig {
        variables: Variable::ALL
            .iter()
            .map(|v| VariableEntry {
                name: v.name(),
                label: v.label(),
            })
            .collect(),
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
        analysis: [DEFAULT_ANALYSIS_START, DEFAULT_ANALYSIS_END],
        period1: [DEFAULT_PERIOD_1.0, DEFAULT_PERIOD_1.1],
        period2: [DEFAULT_PERIOD_2.0, DEFAULT_PERIOD_2.1],
        max_compared: MAX_COMPARED_VARIABLES,
        platform: platform.to_string(),
    };

    let json = serde_json::to_string(&config)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    PAGE_TEMPLATE.replace("__PAGE_CONFIG__", &json)
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>Análisis de Series de Tiempo por ROI</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet-draw@1.0.4/dist/leaflet.draw.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet-draw@1.0.4/dist/leaflet.draw.js"></script>
<style>
body { font-family: sans-serif; margin: 0 1.5rem; }
nav button { padding: .5rem 1rem; border: 1px solid #ccc; background: #f5f5f5; cursor: pointer; }
nav button.active { background: #fff; font-weight: bold; }
section { display: none; padding: 1rem 0; }
section.active { display: block; }
#map { width: 800px; height: 520px; }
.warning { background: #fff3cd; border: 1px solid #ffe69c; padding: .75rem; margin: .5rem 0; }
.error { background: #f8d7da; border: 1px solid #f1aeb5; padding: .75rem; margin: .5rem 0; }
.info { background: #cff4fc; border: 1px solid #9eeaf9; padding: .75rem; margin: .5rem 0; }
label { display: inline-block; margin: .25rem 1rem .25rem 0; }
footer { color: #888; font-size: .8rem; margin: 2rem 0 1rem; }
</style>
</head>
<body>
<h1>Análisis de Series de Tiempo por ROI</h1>
<nav>
  <button data-tab="map-screen">Mapa</button>
  <button data-tab="analysis-screen">Análisis</button>
  <button data-tab="comparison-screen">Comparación</button>
</nav>

<section id="map-screen">
  <h2>Mapa</h2>
  <p>Dibuja un polígono para definir la región de interés (ROI).</p>
  <div id="roi-status"></div>
  <div id="map"></div>
</section>

<section id="analysis-screen">
  <h2>Análisis de Series de Tiempo</h2>
  <label>Fecha de inicio <input type="date" id="a-start"></label>
  <label>Fecha de fin <input type="date" id="a-end"></label>
  <label>Variable <select id="a-variable"></select></label>
  <button id="a-run">Ejecutar Análisis</button>
  <div id="a-out"></div>
</section>

<section id="comparison-screen">
  <h2>Comparación de Períodos</h2>
  <fieldset><legend>Período 1</legend>
    <label>Inicio <input type="date" id="c-start1"></label>
    <label>Fin <input type="date" id="c-end1"></label>
  </fieldset>
  <fieldset><legend>Período 2</legend>
    <label>Inicio <input type="date" id="c-start2"></label>
    <label>Fin <input type="date" id="c-end2"></label>
  </fieldset>
  <div id="c-variables"></div>
  <button id="c-run">Comparar</button>
  <div id="c-out"></div>
</section>

<footer id="footer"></footer>
<script>
const CONFIG = __PAGE_CONFIG__;

function panel(kind, text) {
  const div = document.createElement("div");
  div.className = kind;
  div.textContent = text;
  return div;
}

function svgNode(markup) {
  const holder = document.createElement("div");
  holder.innerHTML = markup;
  return holder;
}

function showTab(id) {
  document.querySelectorAll("nav button").forEach(b => b.classList.toggle("active", b.dataset.tab === id));
  document.querySelectorAll("section").forEach(s => s.classList.toggle("active", s.id === id));
  if (id === "map-screen" && window.leafletMap) window.leafletMap.invalidateSize();
}
document.querySelectorAll("nav button").forEach(b => b.onclick = () => showTab(b.dataset.tab));

async function session() {
  let id = localStorage.getItem("roi-session");
  if (id) {
    const check = await fetch(`/sessions/${id}/roi`);
    if (check.ok) return id;
  }
  const resp = await fetch("/sessions", { method: "POST" });
  id = (await resp.json()).id;
  localStorage.setItem("roi-session", id);
  return id;
}

async function post(url, body) {
  const resp = await fetch(url, {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(body),
  });
  const data = await resp.json();
  if (!resp.ok) throw new Error(data.error || resp.statusText);
  return data;
}

function setupMap(sid) {
  const map = L.map("map").setView(CONFIG.center, CONFIG.zoom);
  window.leafletMap = map;
  L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", { attribution: "&copy; OpenStreetMap" }).addTo(map);
  const drawn = new L.FeatureGroup().addTo(map);
  map.addControl(new L.Control.Draw({
    edit: { featureGroup: drawn },
    draw: { polyline: false, circle: false, circlemarker: false, marker: false },
  }));
  const status = document.getElementById("roi-status");

  fetch(`/sessions/${sid}/roi`).then(r => r.json()).then(data => {
    if (data.roi) {
      L.geoJSON(data.roi).eachLayer(l => drawn.addLayer(l));
      status.replaceChildren(panel("info", "ROI definida."));
    }
  });

  const save = async () => {
    const fc = drawn.toGeoJSON();
    if (!fc.features.length) {
      await fetch(`/sessions/${sid}/roi`, { method: "DELETE" });
      status.replaceChildren(panel("warning", "ROI eliminada."));
      return;
    }
    const resp = await fetch(`/sessions/${sid}/roi`, {
      method: "PUT",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify(fc),
    });
    const data = await resp.json();
    status.replaceChildren(resp.ok ? panel("info", "ROI definida.") : panel("error", data.error));
  };
  map.on(L.Draw.Event.CREATED, e => { drawn.clearLayers(); drawn.addLayer(e.layer); save(); });
  map.on(L.Draw.Event.EDITED, save);
  map.on(L.Draw.Event.DELETED, save);
}

function setupAnalysis(sid) {
  const select = document.getElementById("a-variable");
  CONFIG.variables.forEach(v => select.add(new Option(v.label, v.name)));
  document.getElementById("a-start").value = CONFIG.analysis[0];
  document.getElementById("a-end").value = CONFIG.analysis[1];
  const out = document.getElementById("a-out");

  document.getElementById("a-run").onclick = async () => {
    const body = {
      start: document.getElementById("a-start").value,
      end: document.getElementById("a-end").value,
      variable: select.value,
    };
    out.replaceChildren(document.createTextNode("Ejecutando análisis..."));
    try {
      const report = await post(`/sessions/${sid}/analysis`, body);
      const nodes = report.warnings.map(w => panel("warning", w));
      if (report.chart_svg) {
        nodes.push(svgNode(report.chart_svg));
        const csv = document.createElement("button");
        csv.textContent = "Descargar CSV";
        csv.onclick = () => download(`/sessions/${sid}/analysis?format=csv`, body);
        const png = document.createElement("button");
        png.textContent = "Descargar PNG";
        png.onclick = () => download(`/sessions/${sid}/analysis?format=png`, body);
        nodes.push(csv, png);
      }
      out.replaceChildren(...nodes);
    } catch (e) {
      out.replaceChildren(panel("error", e.message));
    }
  };
}

async function download(url, body) {
  const resp = await fetch(url, {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(body),
  });
  if (!resp.ok) return;
  const disposition = resp.headers.get("Content-Disposition") || "";
  const match = /filename="([^"]+)"/.exec(disposition);
  const link = document.createElement("a");
  link.href = URL.createObjectURL(await resp.blob());
  link.download = match ? match[1] : "timeseries";
  link.click();
}

function setupComparison(sid) {
  const boxes = document.getElementById("c-variables");
  CONFIG.variables.forEach((v, i) => {
    const label = document.createElement("label");
    const box = document.createElement("input");
    box.type = "checkbox";
    box.value = v.name;
    box.checked = i < CONFIG.max_compared;
    label.append(box, document.createTextNode(" " + v.label));
    boxes.appendChild(label);
  });
  document.getElementById("c-start1").value = CONFIG.period1[0];
  document.getElementById("c-end1").value = CONFIG.period1[1];
  document.getElementById("c-start2").value = CONFIG.period2[0];
  document.getElementById("c-end2").value = CONFIG.period2[1];
  const out = document.getElementById("c-out");

  document.getElementById("c-run").onclick = async () => {
    const variables = [...boxes.querySelectorAll("input:checked")].map(b => b.value);
    if (variables.length > CONFIG.max_compared) {
      out.replaceChildren(panel("error", `Selecciona como máximo ${CONFIG.max_compared} variables.`));
      return;
    }
    out.replaceChildren(document.createTextNode("Comparando períodos..."));
    try {
      const report = await post(`/sessions/${sid}/comparison`, {
        period1: { start: document.getElementById("c-start1").value, end: document.getElementById("c-end1").value },
        period2: { start: document.getElementById("c-start2").value, end: document.getElementById("c-end2").value },
        variables,
      });
      const nodes = report.warnings.map(w => panel("warning", w));
      report.results.forEach(r => {
        nodes.push(r.chart_svg ? svgNode(r.chart_svg) : panel("warning", r.warning));
      });
      out.replaceChildren(...nodes);
    } catch (e) {
      out.replaceChildren(panel("error", e.message));
    }
  };
}

session().then(sid => {
  setupMap(sid);
  setupAnalysis(sid);
  setupComparison(sid);
  showTab("map-screen");
});
document.getElementById("footer").textContent = "Plataforma de análisis: " + CONFIG.platform;
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_page_config() {
        let page = index_page("Earth Engine (ivanti-453315)");
        assert!(!page.contains("__PAGE_CONFIG__"));
        assert!(page.contains("\"center\":[33.0,19.0]"));
        assert!(page.contains("\"zoom\":5"));
        assert!(page.contains("\"label\":\"Precipitación (CHIRPS)\""));
        assert!(page.contains("leaflet.draw.js"));
    }
}
