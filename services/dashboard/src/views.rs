//! Page titles and the HTML shell of the dashboard.

use serde::Serialize;

use geodata_common::dataset::LayerStyle;
use geodata_common::{DatasetCatalog, DatasetId, DatasetKind};

/// Heatmap title for a raster dataset and year.
pub fn map_title(id: DatasetId, year: i32) -> String {
    match id {
        DatasetId::Landcover => format!("Land Cover {year}"),
        DatasetId::Gpp => format!("GPP {year}"),
        DatasetId::Precip => format!("Precipitación {year}"),
        DatasetId::Population => format!("Densidad Poblacional {year}"),
        other => format!("{other} {year}"),
    }
}

/// Histogram title for a raster dataset and year.
pub fn histogram_title(id: DatasetId, year: i32) -> String {
    match id {
        DatasetId::Landcover => format!("Histograma Land Cover {year}"),
        DatasetId::Gpp => format!("Histograma GPP {year}"),
        DatasetId::Precip => format!("Histograma Precip {year}"),
        DatasetId::Population => format!("Histograma Población {year}"),
        other => format!("Histograma {other} {year}"),
    }
}

#[derive(Debug, Serialize)]
struct LayerEntry<'a> {
    name: &'static str,
    title: &'a str,
    style: Option<&'a LayerStyle>,
    checked: bool,
}

#[derive(Debug, Serialize)]
struct RasterEntry<'a> {
    name: &'static str,
    title: &'a str,
    years: &'a [i32],
    default_year: Option<i32>,
    value_label: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PageConfig<'a> {
    layers: Vec<LayerEntry<'a>>,
    rasters: Vec<RasterEntry<'a>>,
    source: String,
}

/// Render the single-page dashboard.
///
/// The page loads everything through the dashboard's own JSON and image
/// routes, so a failing dataset only affects its own panel.
pub fn index_page(catalog: &DatasetCatalog, source: &str) -> String {
    let config = PageConfig {
        layers: catalog
            .of_kind(DatasetKind::Vector)
            .map(|def| LayerEntry {
                name: def.id.name(),
                title: &def.title,
                style: def.style.as_ref(),
                checked: def.id == DatasetId::Districts,
            })
            .collect(),
        rasters: catalog
            .of_kind(DatasetKind::Raster)
            .map(|def| RasterEntry {
                name: def.id.name(),
                title: &def.title,
                years: &def.years,
                default_year: def.default_year,
                value_label: def.value_label.as_deref(),
            })
            .collect(),
        source: source.to_string(),
    };

    // `</` cannot appear inside the inline script
    let json = serde_json::to_string(&config)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    PAGE_TEMPLATE.replace("__PAGE_CONFIG__", &json)
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>Dashboard Assaba</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
body { font-family: sans-serif; margin: 0 1.5rem; }
nav button { padding: .5rem 1rem; border: 1px solid #ccc; background: #f5f5f5; cursor: pointer; }
nav button.active { background: #fff; border-bottom-color: #fff; font-weight: bold; }
section { display: none; padding: 1rem 0; }
section.active { display: block; }
#map { width: 700px; height: 500px; }
.row { display: flex; gap: 1rem; flex-wrap: wrap; }
.row img { max-width: 100%; border: 1px solid #eee; }
.warning { background: #fff3cd; border: 1px solid #ffe69c; padding: .75rem; }
.error { background: #f8d7da; border: 1px solid #f1aeb5; padding: .75rem; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ddd; padding: .25rem .5rem; }
pre { background: #f8f8f8; padding: .5rem; }
footer { color: #888; font-size: .8rem; margin: 2rem 0 1rem; }
</style>
</head>
<body>
<h1>Dashboard Assaba</h1>
<nav id="tabs"></nav>
<div id="panels"></div>
<footer id="footer"></footer>
<script>
const CONFIG = __PAGE_CONFIG__;

function panel(kind, text) {
  const div = document.createElement("div");
  div.className = kind;
  div.textContent = text;
  return div;
}

async function fetchJson(url) {
  const resp = await fetch(url);
  const body = await resp.json();
  if (body.warning) throw { kind: "warning", message: body.warning };
  if (body.error) throw { kind: "error", message: body.error };
  return body;
}

function addTab(id, title) {
  const button = document.createElement("button");
  button.textContent = title;
  button.onclick = () => showTab(id);
  button.dataset.tab = id;
  document.getElementById("tabs").appendChild(button);
  const section = document.createElement("section");
  section.id = id;
  document.getElementById("panels").appendChild(section);
  return section;
}

function showTab(id) {
  document.querySelectorAll("nav button").forEach(b => b.classList.toggle("active", b.dataset.tab === id));
  document.querySelectorAll("section").forEach(s => s.classList.toggle("active", s.id === id));
  if (id === "vectors" && window.leafletMap) window.leafletMap.invalidateSize();
}

function vectorTab() {
  const section = addTab("vectors", "Capas Vectoriales");
  section.innerHTML = "<h2>Capas vectoriales (distritos, región, carreteras, ríos)</h2><div id='layer-toggles'></div><div id='layer-messages'></div><div id='map'></div>";
  const map = L.map("map").setView([17.0, -11.0], 7);
  window.leafletMap = map;
  L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", { attribution: "&copy; OpenStreetMap" }).addTo(map);
  const control = L.control.layers(null, null).addTo(map);
  const overlays = {};

  CONFIG.layers.forEach(layer => {
    const label = document.createElement("label");
    const box = document.createElement("input");
    box.type = "checkbox";
    box.checked = layer.checked;
    label.appendChild(box);
    label.appendChild(document.createTextNode(" " + layer.title + " "));
    document.getElementById("layer-toggles").appendChild(label);

    const toggle = async () => {
      if (!box.checked) {
        if (overlays[layer.name]) { map.removeLayer(overlays[layer.name]); }
        return;
      }
      if (overlays[layer.name]) { overlays[layer.name].addTo(map); return; }
      try {
        const data = await fetchJson("/layers/" + layer.name);
        const overlay = L.geoJSON(data, { style: () => layer.style || {} }).addTo(map);
        overlays[layer.name] = overlay;
        control.addOverlay(overlay, layer.title);
      } catch (e) {
        document.getElementById("layer-messages").appendChild(panel(e.kind || "error", e.message || String(e)));
        box.checked = false;
      }
    };
    box.onchange = toggle;
    if (layer.checked) toggle();
  });
}

function rasterTab(raster) {
  const section = addTab("raster-" + raster.name, raster.title);
  const select = document.createElement("select");
  raster.years.forEach(y => {
    const opt = document.createElement("option");
    opt.value = y;
    opt.textContent = y;
    if (y === raster.default_year) opt.selected = true;
    select.appendChild(opt);
  });
  const heading = document.createElement("h2");
  heading.textContent = raster.title;
  const label = document.createElement("label");
  label.textContent = "Selecciona año: ";
  label.appendChild(select);
  const body = document.createElement("div");
  section.append(heading, label, body);

  const load = async () => {
    const year = select.value;
    body.replaceChildren(document.createTextNode("Cargando..."));
    try {
      const summary = await fetchJson(`/rasters/${raster.name}/summary?year=${year}`);
      const row = document.createElement("div");
      row.className = "row";
      const map = document.createElement("img");
      map.src = `/rasters/${raster.name}/heatmap.png?year=${year}`;
      map.alt = summary.title;
      const hist = document.createElement("img");
      hist.src = `/rasters/${raster.name}/histogram.svg?year=${year}`;
      hist.alt = summary.histogram_title;
      row.append(map, hist);
      const caption = document.createElement("p");
      caption.textContent = `${summary.title}: ${raster.value_label || ""} ${summary.min} - ${summary.max} (media ${summary.mean === null ? "-" : summary.mean.toFixed(3)})`;
      const meta = document.createElement("pre");
      meta.textContent = JSON.stringify(summary.metadata, null, 2);
      const metaTitle = document.createElement("strong");
      metaTitle.textContent = "Metadatos:";
      body.replaceChildren(row, caption, metaTitle, meta);
    } catch (e) {
      body.replaceChildren(panel(e.kind || "error", e.message || String(e)));
    }
  };
  select.onchange = load;
  load();
}

function districtsTab() {
  const section = addTab("districts", "Información Distritos");
  section.innerHTML = "<h2>Información de Distritos (Tabla de Atributos)</h2><div id='district-body'></div>";
  const body = document.getElementById("district-body");
  fetchJson("/districts/table").then(data => {
    const table = document.createElement("table");
    const head = table.insertRow();
    data.columns.forEach(c => { const th = document.createElement("th"); th.textContent = c; head.appendChild(th); });
    data.records.forEach(r => {
      const tr = table.insertRow();
      data.columns.forEach(c => { tr.insertCell().textContent = r[c] === null || r[c] === undefined ? "" : r[c]; });
    });
    const count = document.createElement("p");
    count.textContent = "Cantidad de distritos: " + data.count;
    body.replaceChildren(table, count);
    if (data.names.length) {
      const names = document.createElement("p");
      names.textContent = "Nombres de los distritos: " + data.names.join(", ");
      body.appendChild(names);
    }
  }).catch(e => body.replaceChildren(panel(e.kind || "error", e.message || String(e))));
}

vectorTab();
CONFIG.rasters.forEach(rasterTab);
districtsTab();
showTab("vectors");
document.getElementById("footer").textContent = "Fuente de datos: " + CONFIG.source;
</script>
</body>
</html>
"##;
